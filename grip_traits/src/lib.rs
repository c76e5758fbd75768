pub mod clock;

pub use clock::{Clock, MonotonicClock, ScaledClock};

/// A force sensor (typically a hanging scale) that yields readings in kilograms.
///
/// `read` blocks until a reading is available or `timeout` expires. Implementations
/// signal "no more data" (a finished trace, a dropped link) with an error whose
/// message contains `closed` or `exhausted`; anything else is treated as transient.
pub trait ForceSource {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: ForceSource + ?Sized> ForceSource for Box<T> {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
}
