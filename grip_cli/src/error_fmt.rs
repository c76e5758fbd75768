//! Human-readable error descriptions and structured JSON error formatting.

use grip_core::error::{BuildError, GripError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid protocol ({msg}).\nLikely causes: Out-of-range values in the [protocol] section.\nHow to fix: Edit the config file, then rerun. Defaults are 24 cycles of 7 s work / 3 s rest."
        );
    }

    if let Some(ge) = err.downcast_ref::<GripError>() {
        return match ge {
            GripError::NotFound(id) => format!(
                "What happened: No saved assessment or max force test has id {id}.\nLikely causes: The id was mistyped or the record was deleted.\nHow to fix: Run `grip history` (or `grip history --max-force`) to list the stored ids."
            ),
            GripError::Storage(detail) => format!(
                "What happened: The assessment store could not be read or written ({detail}).\nLikely causes: The JSON file was edited by hand or belongs to another program.\nHow to fix: Point [storage] path at a fresh file, or restore it from a backup with `grip import`."
            ),
            GripError::Io(detail) => format!(
                "What happened: A file operation failed ({detail}).\nLikely causes: Missing directory or insufficient permissions.\nHow to fix: Check the path and its permissions, then rerun."
            ),
            GripError::Timeout => "What happened: The force source timed out.\nLikely causes: The scale stopped sending readings or runner.read_timeout_ms is too low.\nHow to fix: Check the scale connection and consider raising runner.read_timeout_ms.".to_string(),
            GripError::Source(detail) | GripError::SourceClosed(detail) => format!(
                "What happened: The force source failed ({detail}).\nLikely causes: The scale disconnected or the trace ended early.\nHow to fix: Reconnect the scale or check the trace file, then start a new assessment."
            ),
            GripError::State(detail) => format!(
                "What happened: {detail}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or trace loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 't_ms,force_kg'.".to_string();
    }

    if lower.contains("parse config") || lower.starts_with("protocol.")
        || lower.starts_with("runner.")
        || lower.starts_with("sim.")
        || lower.starts_with("logging.")
    {
        let cause = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({cause}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config file and try again; every section is optional."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<GripError>() {
        Some(GripError::NotFound(_)) => 3,
        Some(GripError::Storage(_) | GripError::Io(_)) => 4,
        Some(GripError::Source(_) | GripError::SourceClosed(_) | GripError::Timeout) => 5,
        Some(GripError::State(_)) | None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    match err.downcast_ref::<GripError>() {
        Some(GripError::NotFound(_)) => "NotFound",
        Some(GripError::Storage(_)) => "Storage",
        Some(GripError::Io(_)) => "Io",
        Some(GripError::Timeout) => "Timeout",
        Some(GripError::Source(_) | GripError::SourceClosed(_)) => "Source",
        Some(GripError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_has_its_own_code_and_hint() {
        let id = uuid::Uuid::nil();
        let err = eyre::Report::new(GripError::NotFound(id));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("grip history"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "NotFound");
    }

    #[test]
    fn wrapped_storage_error_keeps_code() {
        use eyre::WrapErr;
        let err: eyre::Result<()> =
            Err(eyre::Report::new(GripError::Storage("bad json".into()))).wrap_err("open store");
        let err = err.unwrap_err();
        assert_eq!(exit_code_for_error(&err), 4);
    }

    #[test]
    fn config_messages_are_recognised() {
        let err = eyre::eyre!("protocol.work_secs must be >= 1");
        assert!(humanize(&err).starts_with("What happened: Configuration is invalid"));
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
