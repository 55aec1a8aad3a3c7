//! Messages exchanged between the relay client and the socket command server

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single command sent over the TCP hop
///
/// Serialized as `{"Type": "<operation>", "Params": {...}}`. The lowercase
/// spellings are accepted on input as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Bare operation name (namespace prefix already stripped)
    #[serde(rename = "Type", alias = "type")]
    pub command_type: String,
    /// Parameter bag, validated by the dispatcher
    #[serde(rename = "Params", alias = "params", default)]
    pub params: Map<String, Value>,
}

impl CommandEnvelope {
    pub fn new(command_type: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            command_type: command_type.into(),
            params,
        }
    }

    /// Build an envelope from an arbitrary JSON value
    ///
    /// Anything other than an object (including `null`) becomes an empty bag.
    pub fn from_value(command_type: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(command_type, params)
    }
}

/// Uniform outcome of every dispatched operation
///
/// Exactly one of `result` (on success, optional) or `error` (on failure)
/// carries the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the operation succeeded
    #[serde(default)]
    pub success: bool,
    /// Operation output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    /// Successful outcome carrying a value
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Failed outcome with a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The failure message, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_uses_capitalized_keys() {
        let env = CommandEnvelope::from_value("create_sphere", json!({"radius": 5}));
        let value = serde_json::to_value(&env).unwrap();

        assert_eq!(value["Type"], "create_sphere");
        assert_eq!(value["Params"]["radius"], 5);
        assert!(value.get("type").is_none());
    }

    #[test]
    fn test_envelope_accepts_lowercase_keys() {
        let env: CommandEnvelope =
            serde_json::from_str(r#"{"type":"get_scene_info","params":{}}"#).unwrap();
        assert_eq!(env.command_type, "get_scene_info");
        assert!(env.params.is_empty());
    }

    #[test]
    fn test_envelope_missing_params_defaults_empty() {
        let env: CommandEnvelope = serde_json::from_str(r#"{"Type":"health_check"}"#).unwrap();
        assert!(env.params.is_empty());
    }

    #[test]
    fn test_envelope_missing_type_is_rejected() {
        let result: Result<CommandEnvelope, _> = serde_json::from_str(r#"{"Params":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_from_non_object_params() {
        let env = CommandEnvelope::from_value("clear_scene", Value::Null);
        assert!(env.params.is_empty());
    }

    #[test]
    fn test_result_ok_shape() {
        let value = serde_json::to_value(CommandResult::ok(json!({"objectId": "abc"}))).unwrap();
        assert_eq!(value, json!({"success": true, "result": {"objectId": "abc"}}));
    }

    #[test]
    fn test_result_failure_shape() {
        let value = serde_json::to_value(CommandResult::failure("no active document")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "no active document"}));
    }

    #[test]
    fn test_result_error_only_payload_parses_as_failure() {
        let result: CommandResult = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.error_message(), Some("boom"));
    }
}
