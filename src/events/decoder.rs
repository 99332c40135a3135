//! Module protocol: decoding the event lines modules print to stdout.
//!
//! A module speaks to the station by printing one JSON object per line.
//! Decoding is pure and per-line; a bad line is reported and the next line
//! decodes as if nothing happened.

use serde_json::Value;

use crate::error::DecodeError;

/// One decoded event from a module's stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEvent {
    /// The module reports normal progress.
    ActivityInfo {
        /// Display name of the component the message is about.
        source: String,
        message: String,
    },
    /// The module reports a failure worth surfacing.
    ActivityError {
        source: String,
        message: String,
    },
    /// Cumulative jobs-completed counter for this module run.
    JobsCompleted { total: u64 },
}

/// Decodes one stdout line from the module called `module_name`.
///
/// Three wire shapes are supported:
///
/// ```text
/// {"type":"activity:info","message":"...","module":"..."}
/// {"type":"activity:error","message":"...","module":"..."}
/// {"type":"jobs-completed","total":123}
/// ```
///
/// `module` is optional and defaults to `module_name`. The generic
/// self-name `Module Runtime` in a message is rewritten to `module_name`
/// (first occurrence, display normalization only).
///
/// # Example
/// ```
/// use station_core::{decode_line, ModuleEvent};
///
/// let event = decode_line(r#"{"type":"jobs-completed","total":8}"#, "Zinnia").unwrap();
/// assert_eq!(event, ModuleEvent::JobsCompleted { total: 8 });
/// ```
pub fn decode_line(line: &str, module_name: &str) -> Result<ModuleEvent, DecodeError> {
    let value: Value = serde_json::from_str(line).map_err(|err| DecodeError::Malformed {
        reason: err.to_string(),
    })?;
    let event_type = value.get("type").and_then(Value::as_str).unwrap_or("<none>");
    match event_type {
        "activity:info" => {
            let (source, message) = activity_payload(&value, module_name)?;
            Ok(ModuleEvent::ActivityInfo { source, message })
        }
        "activity:error" => {
            let (source, message) = activity_payload(&value, module_name)?;
            Ok(ModuleEvent::ActivityError { source, message })
        }
        "jobs-completed" => {
            let total = value.get("total").and_then(Value::as_u64).ok_or_else(|| {
                DecodeError::Malformed {
                    reason: "jobs-completed without a numeric total".to_string(),
                }
            })?;
            Ok(ModuleEvent::JobsCompleted { total })
        }
        other => Err(DecodeError::Unsupported {
            event_type: other.to_string(),
        }),
    }
}

fn activity_payload(value: &Value, module_name: &str) -> Result<(String, String), DecodeError> {
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed {
            reason: "activity event without a message".to_string(),
        })?;
    let source = value
        .get("module")
        .and_then(Value::as_str)
        .unwrap_or(module_name);
    Ok((
        source.to_string(),
        message.replacen("Module Runtime", module_name, 1),
    ))
}
