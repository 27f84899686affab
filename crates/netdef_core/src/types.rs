//! Core scalar and role types shared by every stage of the pipeline
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar types a replicated attribute can carry.
///
/// The upper-case tags are also the argument type strings written into
/// `rpc_calls.<name>.arguments` of an actor definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    Int,
    Bool,
    String,
    Float,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ValueType::Int => "INT",
            ValueType::Bool => "BOOL",
            ValueType::String => "STRING",
            ValueType::Float => "FLOAT",
        };
        f.write_str(tag)
    }
}

/// A typed scalar value, serialized as a bare JSON scalar.
///
/// Variant order matters for untagged deserialization: `true` must not be
/// read as an integer and `100` must not be read as a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// Network authority of an object instance on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkRole {
    Server,
    AutonomousProxy,
    #[default]
    SimulatedProxy,
    DumbProxy,
    None,
}

impl NetworkRole {
    /// Roles with no simulated behaviour never realize client-side states.
    pub fn has_no_states(&self) -> bool {
        matches!(self, NetworkRole::DumbProxy | NetworkRole::None)
    }
}

/// Where a remote call is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcTarget {
    #[default]
    Server,
    Client,
    Owner,
}

/// Identifier-like names only: letters, digits and underscores, not
/// leading with a digit once underscores are stripped.
pub fn is_valid_identifier(name: &str) -> bool {
    let stripped: String = name.chars().filter(|c| *c != '_').collect();

    match stripped.chars().next() {
        Some(first) => {
            !first.is_numeric() && stripped.chars().all(char::is_alphanumeric)
        }
        None => false,
    }
}

/// Dotted module path such as `game_system.entities`.
pub fn is_valid_module_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_valid_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("health"));
        assert!(is_valid_identifier("max_speed2"));
        assert!(is_valid_identifier("_private"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("___"));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("_1x"));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier("dash-name"));
        assert!(!is_valid_identifier("Prop.1"));
    }

    #[test]
    fn test_module_path_validation() {
        assert!(is_valid_module_path("game_system.entities"));
        assert!(is_valid_module_path("actors"));
        assert!(!is_valid_module_path(""));
        assert!(!is_valid_module_path("game_system..entities"));
        assert!(!is_valid_module_path("game system"));
    }

    #[test]
    fn test_value_json_shape() {
        assert_eq!(serde_json::to_string(&Value::Int(100)).unwrap(), "100");
        assert_eq!(serde_json::to_string(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Value::from("abc")).unwrap(), "\"abc\"");

        let int: Value = serde_json::from_str("100").unwrap();
        assert_eq!(int, Value::Int(100));
        let float: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(float, Value::Float(2.5));
        let boolean: Value = serde_json::from_str("false").unwrap();
        assert_eq!(boolean.value_type(), ValueType::Bool);
    }

    #[test]
    fn test_role_and_target_tags() {
        assert_eq!(
            serde_json::to_string(&NetworkRole::AutonomousProxy).unwrap(),
            "\"AUTONOMOUS_PROXY\""
        );
        assert_eq!(serde_json::to_string(&RpcTarget::Server).unwrap(), "\"SERVER\"");
        assert_eq!(NetworkRole::default(), NetworkRole::SimulatedProxy);
        assert!(NetworkRole::None.has_no_states());
        assert!(!NetworkRole::Server.has_no_states());
        assert_eq!(ValueType::Float.to_string(), "FLOAT");
    }
}
