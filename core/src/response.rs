//! Defensive parsing of the model reply into the validated contract.
//!
//! Two explicit stages: normalize (strip an optional markdown fence the
//! model may have wrapped the reply in), then parse and shape-check
//! strictly. The stripping is tolerant; the validation never is.

use serde_json::Value;
use thiserror::Error;

/// The validated generation contract: a flat list of independently runnable
/// command strings plus a prose explanation. An empty `commands` list is
/// valid and means no detected tool combination can satisfy the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    pub commands: Vec<String>,
    pub explanation: String,
}

/// A reply that broke the output contract. Carries the untouched raw text,
/// never a cleaned intermediate, so the operator sees exactly what the
/// model sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model reply failed validation: {reason}")]
pub struct ValidationFailure {
    pub reason: String,
    pub raw: String,
}

impl ValidationFailure {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// Validate a raw backend reply. Synchronous and pure; both backends route
/// their output through this single function.
pub fn validate_response(raw: &str) -> Result<GenerateResult, ValidationFailure> {
    let cleaned = strip_code_fence(raw);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|err| ValidationFailure::new(format!("reply is not valid JSON: {err}"), raw))?;

    let Value::Object(object) = value else {
        return Err(ValidationFailure::new("reply is not a JSON object", raw));
    };

    if let Some(extra) = object
        .keys()
        .find(|key| *key != "commands" && *key != "explanation")
    {
        return Err(ValidationFailure::new(
            format!("unexpected top-level field `{extra}`"),
            raw,
        ));
    }

    let commands = match object.get("commands") {
        Some(Value::Array(items)) => {
            let mut commands = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let Value::String(command) = item else {
                    return Err(ValidationFailure::new(
                        format!("`commands[{index}]` is not a string (got {})", kind_of(item)),
                        raw,
                    ));
                };
                commands.push(command.clone());
            }
            commands
        }
        Some(other) => {
            return Err(ValidationFailure::new(
                format!("`commands` is not an array (got {})", kind_of(other)),
                raw,
            ));
        }
        None => return Err(ValidationFailure::new("missing `commands` field", raw)),
    };

    let explanation = match object.get("explanation") {
        Some(Value::String(explanation)) => explanation.clone(),
        Some(other) => {
            return Err(ValidationFailure::new(
                format!("`explanation` is not a string (got {})", kind_of(other)),
                raw,
            ));
        }
        None => return Err(ValidationFailure::new("missing `explanation` field", raw)),
    };

    Ok(GenerateResult {
        commands,
        explanation,
    })
}

/// Strip one optional surrounding markdown code fence, with or without a
/// language tag. A no-op when the text is not fenced; an unterminated fence
/// is left alone and fails downstream in the parser instead.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
    let body = &rest[body_start..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => trimmed,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"{"commands":["ffmpeg -i in.mp4 -c:v libx264 in_converted.mp4"],"explanation":"Re-encodes the video."}"#;

    #[test]
    fn plain_reply_validates() {
        let result = validate_response(VALID).unwrap();
        assert_eq!(
            result.commands,
            vec!["ffmpeg -i in.mp4 -c:v libx264 in_converted.mp4".to_string()]
        );
        assert_eq!(result.explanation, "Re-encodes the video.");
    }

    #[test]
    fn fenced_reply_validates_identically() {
        let fenced = format!("```json\n{VALID}\n```");
        let bare_fence = format!("```\n{VALID}\n```");
        assert_eq!(validate_response(&fenced), validate_response(VALID));
        assert_eq!(validate_response(&bare_fence), validate_response(VALID));
    }

    #[test]
    fn empty_commands_is_a_valid_result() {
        let result =
            validate_response(r#"{"commands":[],"explanation":"cannot be done"}"#).unwrap();
        assert!(result.commands.is_empty());
        assert_eq!(result.explanation, "cannot be done");
    }

    #[test]
    fn unparseable_text_is_rejected() {
        let raw = "I'd be happy to help with that conversion!";
        let failure = validate_response(raw).unwrap_err();
        assert!(failure.reason.contains("not valid JSON"));
    }

    #[test]
    fn missing_commands_field_is_rejected() {
        let failure = validate_response(r#"{"explanation":"hi"}"#).unwrap_err();
        assert_eq!(failure.reason, "missing `commands` field");
    }

    #[test]
    fn non_string_command_element_is_rejected() {
        let failure =
            validate_response(r#"{"commands":["ok", 3],"explanation":"hi"}"#).unwrap_err();
        assert_eq!(failure.reason, "`commands[1]` is not a string (got a number)");
    }

    #[test]
    fn non_string_explanation_is_rejected() {
        let failure =
            validate_response(r#"{"commands":[],"explanation":["prose"]}"#).unwrap_err();
        assert_eq!(failure.reason, "`explanation` is not a string (got an array)");
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        let failure = validate_response(r#"["cmd"]"#).unwrap_err();
        assert_eq!(failure.reason, "reply is not a JSON object");
    }

    #[test]
    fn extra_top_level_field_is_rejected() {
        let failure = validate_response(
            r#"{"commands":[],"explanation":"hi","confidence":0.9}"#,
        )
        .unwrap_err();
        assert_eq!(failure.reason, "unexpected top-level field `confidence`");
    }

    #[test]
    fn failure_preserves_the_original_raw_text() {
        let raw = "```json\n{\"commands\": oops}\n```";
        let failure = validate_response(raw).unwrap_err();
        assert_eq!(failure.raw, raw);

        let unfenced = "  {\"commands\": oops}  ";
        let failure = validate_response(unfenced).unwrap_err();
        assert_eq!(failure.raw, unfenced);
    }

    #[test]
    fn fence_stripper_is_a_noop_without_a_fence() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        let raw = "```json\n{\"commands\":[]}";
        assert_eq!(strip_code_fence(raw), raw);
    }
}
