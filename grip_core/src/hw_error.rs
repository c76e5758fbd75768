//! Maps `Box<dyn Error>` from the `ForceSource` boundary to typed `GripError`.
//!
//! The sampler only needs to know whether a failure is transient (skip the
//! reading) or terminal (stop sampling). With the `hardware-errors` feature
//! the `grip_hardware::HwError` variants are matched exactly.

use crate::error::GripError;

/// Map a trait-boundary error to a typed `GripError`.
pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> GripError {
    #[cfg(feature = "hardware-errors")]
    {
        use grip_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => GripError::Timeout,
                HwError::Exhausted => GripError::SourceClosed(hw.to_string()),
                HwError::Closed(why) => GripError::SourceClosed(why.clone()),
                HwError::Io(io) => GripError::Source(io.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") {
        GripError::Timeout
    } else if lower.contains("closed") || lower.contains("exhausted") || lower.contains("disconnect")
    {
        GripError::SourceClosed(s)
    } else {
        GripError::Source(s)
    }
}
