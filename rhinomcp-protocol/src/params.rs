//! Schema-validated parameter bags
//!
//! Raw `Params` maps arrive as untyped JSON. [`ParamBag::validate`] checks them
//! against an operation's declared [`ParamSpec`] list once, at the dispatcher
//! boundary, so operation handlers only ever see well-typed values.

use serde_json::{Map, Value};

use crate::catalog::ParamSpec;

/// Parameter validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("missing required parameter '{0}'")]
    Missing(String),

    #[error("parameter '{name}' must be a {expected}, got {got}")]
    WrongType {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
}

/// A parameter map that has passed schema validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    values: Map<String, Value>,
    ignored: Vec<String>,
}

impl ParamBag {
    /// Validate `params` against `specs`
    ///
    /// Required parameters must be present and non-null; present parameters
    /// must match their declared primitive type. A `null` optional parameter is
    /// treated as absent. Undeclared keys are dropped and reported through
    /// [`ParamBag::ignored`].
    pub fn validate(specs: &[ParamSpec], params: &Map<String, Value>) -> Result<Self, ParamError> {
        let mut values = Map::new();

        for spec in specs {
            match params.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ParamError::Missing(spec.name.to_string()));
                    }
                }
                Some(value) => {
                    if !spec.param_type.matches(value) {
                        return Err(ParamError::WrongType {
                            name: spec.name.to_string(),
                            expected: spec.param_type.as_str(),
                            got: json_type_name(value),
                        });
                    }
                    values.insert(spec.name.to_string(), value.clone());
                }
            }
        }

        let ignored = params
            .keys()
            .filter(|key| !specs.iter().any(|s| s.name == key.as_str()))
            .cloned()
            .collect();

        Ok(Self { values, ignored })
    }

    /// Required numeric parameter
    pub fn number(&self, name: &str) -> Result<f64, ParamError> {
        self.opt_number(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn opt_number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    /// Required string parameter
    pub fn string(&self, name: &str) -> Result<&str, ParamError> {
        self.opt_string(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn opt_string(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Boolean parameter, `false` when absent
    pub fn flag(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Keys that were supplied but not declared
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Operation;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_valid_sphere_params() {
        let params = map(json!({"centerX": 0, "centerY": 1.5, "centerZ": -2, "radius": 5}));
        let bag = ParamBag::validate(Operation::CreateSphere.params(), &params).unwrap();

        assert_eq!(bag.number("centerY").unwrap(), 1.5);
        assert_eq!(bag.number("radius").unwrap(), 5.0);
        assert_eq!(bag.opt_string("color"), None);
    }

    #[test]
    fn test_missing_required() {
        let params = map(json!({"centerX": 0, "centerY": 0, "centerZ": 0}));
        let err = ParamBag::validate(Operation::CreateSphere.params(), &params).unwrap_err();
        assert_eq!(err, ParamError::Missing("radius".into()));
    }

    #[test]
    fn test_null_required_counts_as_missing() {
        let params = map(json!({"name": null}));
        let err = ParamBag::validate(Operation::CreateLayer.params(), &params).unwrap_err();
        assert_eq!(err, ParamError::Missing("name".into()));
    }

    #[test]
    fn test_wrong_type() {
        let params = map(json!({"name": 42}));
        let err = ParamBag::validate(Operation::CreateLayer.params(), &params).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter 'name' must be a string, got number"
        );
    }

    #[test]
    fn test_optional_flag_defaults_false() {
        let bag = ParamBag::validate(Operation::ClearScene.params(), &Map::new()).unwrap();
        assert!(!bag.flag("currentLayerOnly"));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_undeclared_keys_are_ignored() {
        let params = map(json!({"currentLayerOnly": true, "force": 1}));
        let bag = ParamBag::validate(Operation::ClearScene.params(), &params).unwrap();

        assert!(bag.flag("currentLayerOnly"));
        assert_eq!(bag.ignored(), &["force".to_string()]);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_null_optional_is_absent() {
        let params = map(json!({"name": "walls", "color": null}));
        let bag = ParamBag::validate(Operation::CreateLayer.params(), &params).unwrap();
        assert_eq!(bag.string("name").unwrap(), "walls");
        assert_eq!(bag.opt_string("color"), None);
    }
}
