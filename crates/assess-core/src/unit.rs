//! Assessment units and the parameters attached to them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Priority assigned to a unit that does not carry one.
pub const DEFAULT_PRIORITY: u32 = 1;

/// A single typed parameter value passed to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Encoded as a typed switch (`-Name:$true`).
    Bool(bool),

    /// Encoded as its literal textual form.
    Number(serde_json::Number),

    /// Passed through as one argument token.
    Text(String),
}

impl ParamValue {
    /// Encode this value as argument tokens for the parameter `key`.
    pub fn to_args(&self, key: &str) -> Vec<String> {
        match self {
            ParamValue::Bool(b) => vec![format!("-{}:${}", key, b)],
            ParamValue::Number(n) => vec![format!("-{}", key), n.to_string()],
            ParamValue::Text(s) => vec![format!("-{}", key), s.clone()],
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Named parameters merged into every unit of a run.
pub type ParameterSet = BTreeMap<String, ParamValue>;

/// Encode a whole parameter set into argument tokens, in key order.
pub fn encode_parameters(parameters: &ParameterSet) -> Vec<String> {
    parameters
        .iter()
        .flat_map(|(key, value)| value.to_args(key))
        .collect()
}

/// One schedulable assessment unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Path of the script to execute; also the unit's identity.
    pub path: String,

    /// Stage the unit runs in. Lower runs earlier.
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Parameters encoded onto the command line.
    #[serde(default)]
    pub parameters: ParameterSet,
}

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

impl UnitSpec {
    /// Create a unit with no parameters.
    pub fn new(path: impl Into<String>, priority: u32) -> Self {
        Self {
            path: path.into(),
            priority,
            parameters: ParameterSet::new(),
        }
    }

    /// Attach a parameter set, replacing any existing one.
    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    /// Argument tokens for this unit's parameters.
    pub fn args(&self) -> Vec<String> {
        encode_parameters(&self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_encodes_as_typed_switch() {
        assert_eq!(ParamValue::Bool(true).to_args("Detailed"), vec!["-Detailed:$true"]);
        assert_eq!(ParamValue::Bool(false).to_args("Detailed"), vec!["-Detailed:$false"]);
    }

    #[test]
    fn test_text_stays_one_token() {
        let args = ParamValue::from("Contoso Ltd; rm -rf /").to_args("Tenant");
        assert_eq!(args, vec!["-Tenant".to_string(), "Contoso Ltd; rm -rf /".to_string()]);
    }

    #[test]
    fn test_number_encodes_literally() {
        assert_eq!(ParamValue::from(30_i64).to_args("Days"), vec!["-Days", "30"]);

        let float: ParamValue = serde_json::from_value(json!(0.5)).unwrap();
        assert_eq!(float.to_args("Ratio"), vec!["-Ratio", "0.5"]);
    }

    #[test]
    fn test_param_value_deserializes_by_json_type() {
        let params: ParameterSet = serde_json::from_value(json!({
            "flag": true,
            "count": 3,
            "name": "x",
        }))
        .unwrap();

        assert_eq!(params["flag"], ParamValue::Bool(true));
        assert_eq!(params["count"], ParamValue::from(3_i64));
        assert_eq!(params["name"], ParamValue::from("x"));
    }

    #[test]
    fn test_param_value_rejects_null_and_containers() {
        assert!(serde_json::from_value::<ParamValue>(json!(null)).is_err());
        assert!(serde_json::from_value::<ParamValue>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<ParamValue>(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_encode_parameters_in_key_order() {
        let mut params = ParameterSet::new();
        params.insert("Zeta".to_string(), ParamValue::from(1_i64));
        params.insert("Alpha".to_string(), ParamValue::from(true));

        assert_eq!(encode_parameters(&params), vec!["-Alpha:$true", "-Zeta", "1"]);
    }

    #[test]
    fn test_unit_spec_defaults_from_wire() {
        let unit: UnitSpec = serde_json::from_value(json!({ "path": "a.ps1" })).unwrap();
        assert_eq!(unit.priority, DEFAULT_PRIORITY);
        assert!(unit.parameters.is_empty());

        let unit: UnitSpec =
            serde_json::from_value(json!({ "path": "b.ps1", "priority": 3, "parameters": {"x": "y"} }))
                .unwrap();
        assert_eq!(unit.priority, 3);
        assert_eq!(unit.args(), vec!["-x", "y"]);
    }
}
