//! Typed contract arguments and their operator-facing JSON form.

use crate::crypto::AccountId;
use crate::error::ConsoleError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractParameter {
    /// Encoded as `PUSHNULL`.
    Any,
    Boolean(bool),
    Integer(i128),
    ByteArray(Vec<u8>),
    String(String),
    Hash160(AccountId),
    Hash256([u8; 32]),
    PublicKey(Vec<u8>),
    Signature(Vec<u8>),
    Array(Vec<ContractParameter>),
}

impl ContractParameter {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContractParameter::Any => "Any",
            ContractParameter::Boolean(_) => "Boolean",
            ContractParameter::Integer(_) => "Integer",
            ContractParameter::ByteArray(_) => "ByteArray",
            ContractParameter::String(_) => "String",
            ContractParameter::Hash160(_) => "Hash160",
            ContractParameter::Hash256(_) => "Hash256",
            ContractParameter::PublicKey(_) => "PublicKey",
            ContractParameter::Signature(_) => "Signature",
            ContractParameter::Array(_) => "Array",
        }
    }

    /// Parses `{"type": "...", "value": ...}` or a bare JSON scalar/array.
    ///
    /// Bare strings become `String`, numbers `Integer`, booleans `Boolean`,
    /// `null` becomes `Any` and arrays are parsed element-wise.
    pub fn from_json(value: &Value) -> Result<Self, ConsoleError> {
        match value {
            Value::Null => Ok(ContractParameter::Any),
            Value::Bool(b) => Ok(ContractParameter::Boolean(*b)),
            Value::Number(n) => parse_integer(&n.to_string()).map(ContractParameter::Integer),
            Value::String(s) => Ok(ContractParameter::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(ContractParameter::Array),
            Value::Object(map) => {
                let ty = map.get("type").and_then(Value::as_str).ok_or_else(|| {
                    ConsoleError::Encoding("Contract parameter object needs a \"type\"".to_string())
                })?;
                let inner = map.get("value").unwrap_or(&Value::Null);
                Self::from_typed_json(ty, inner)
            }
        }
    }

    fn from_typed_json(ty: &str, value: &Value) -> Result<Self, ConsoleError> {
        let text = || -> Result<String, ConsoleError> {
            match value {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                other => Err(ConsoleError::Encoding(format!(
                    "{} parameter cannot take value {}",
                    ty, other
                ))),
            }
        };

        match ty {
            "Any" => Ok(ContractParameter::Any),
            "Boolean" => match value {
                Value::Bool(b) => Ok(ContractParameter::Boolean(*b)),
                _ => match text()?.to_ascii_lowercase().as_str() {
                    "true" => Ok(ContractParameter::Boolean(true)),
                    "false" => Ok(ContractParameter::Boolean(false)),
                    other => Err(ConsoleError::Encoding(format!("Malformed boolean '{}'", other))),
                },
            },
            "Integer" => parse_integer(&text()?).map(ContractParameter::Integer),
            "ByteArray" => decode_base64(&text()?).map(ContractParameter::ByteArray),
            "Signature" => decode_base64(&text()?).map(ContractParameter::Signature),
            "String" => Ok(ContractParameter::String(text()?)),
            "Hash160" => text()?
                .parse::<AccountId>()
                .map(ContractParameter::Hash160)
                .map_err(|e| ConsoleError::Encoding(e.to_string())),
            "Hash256" => {
                let raw = text()?;
                let digits = raw.trim_start_matches("0x");
                let bytes = hex::decode(digits)
                    .map_err(|e| ConsoleError::Encoding(format!("Malformed Hash256 '{}': {}", raw, e)))?;
                let arr: [u8; 32] = bytes.try_into().map_err(|_| {
                    ConsoleError::Encoding(format!("Hash256 '{}' must be 32 bytes", raw))
                })?;
                Ok(ContractParameter::Hash256(arr))
            }
            "PublicKey" => {
                let raw = text()?;
                hex::decode(raw.trim())
                    .map(ContractParameter::PublicKey)
                    .map_err(|e| ConsoleError::Encoding(format!("Malformed public key '{}': {}", raw, e)))
            }
            "Array" => match value {
                Value::Array(_) => Self::from_json(value),
                other => Err(ConsoleError::Encoding(format!(
                    "Array parameter needs a JSON array, got {}",
                    other
                ))),
            },
            other => Err(ConsoleError::Encoding(format!(
                "Unsupported contract parameter type '{}'",
                other
            ))),
        }
    }
}

/// Parses a JSON array of contract parameters, as typed after `invoke`.
pub fn parse_parameter_list(json: &str) -> Result<Vec<ContractParameter>, ConsoleError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ConsoleError::Encoding(format!("Malformed parameter list: {}", e)))?;
    match value {
        Value::Array(items) => items.iter().map(ContractParameter::from_json).collect(),
        _ => Err(ConsoleError::Encoding(
            "Contract parameters must be a JSON array".to_string(),
        )),
    }
}

/// Integer literal in decimal, or hex with a `0x` prefix.
pub fn parse_integer(literal: &str) -> Result<i128, ConsoleError> {
    let trimmed = literal.trim();
    let malformed = |reason: String| {
        ConsoleError::Encoding(format!("Malformed integer literal '{}': {}", literal, reason))
    };
    let parsed = match trimmed.strip_prefix("0x") {
        // from_str_radix would take a sign after the prefix
        Some(hex_digits) if hex_digits.starts_with(['+', '-']) => {
            return Err(malformed("sign after 0x".to_string()))
        }
        Some(hex_digits) => i128::from_str_radix(hex_digits, 16),
        None => trimmed.parse::<i128>(),
    };
    parsed.map_err(|e| malformed(e.to_string()))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, ConsoleError> {
    BASE64
        .decode(text.trim())
        .map_err(|e| ConsoleError::Encoding(format!("Malformed base64 '{}': {}", text, e)))
}

impl fmt::Display for ContractParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractParameter::Any => write!(f, "null"),
            ContractParameter::Boolean(b) => write!(f, "{}", b),
            ContractParameter::Integer(i) => write!(f, "{}", i),
            ContractParameter::ByteArray(b)
            | ContractParameter::PublicKey(b)
            | ContractParameter::Signature(b) => write!(f, "{}", hex::encode(b)),
            ContractParameter::String(s) => write!(f, "\"{}\"", s),
            ContractParameter::Hash160(a) => write!(f, "{}", a),
            ContractParameter::Hash256(h) => write!(f, "0x{}", hex::encode(h)),
            ContractParameter::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<AccountId> for ContractParameter {
    fn from(account: AccountId) -> Self {
        ContractParameter::Hash160(account)
    }
}

impl From<Option<AccountId>> for ContractParameter {
    fn from(account: Option<AccountId>) -> Self {
        account.map_or(ContractParameter::Any, ContractParameter::Hash160)
    }
}

impl From<i128> for ContractParameter {
    fn from(value: i128) -> Self {
        ContractParameter::Integer(value)
    }
}

impl From<i64> for ContractParameter {
    fn from(value: i64) -> Self {
        ContractParameter::Integer(value as i128)
    }
}

impl From<u32> for ContractParameter {
    fn from(value: u32) -> Self {
        ContractParameter::Integer(value as i128)
    }
}

impl From<bool> for ContractParameter {
    fn from(value: bool) -> Self {
        ContractParameter::Boolean(value)
    }
}

impl From<&str> for ContractParameter {
    fn from(value: &str) -> Self {
        ContractParameter::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_objects() {
        let params = parse_parameter_list(
            r#"[{"type":"Integer","value":"42"},
                {"type":"Hash160","value":"0xd2a4cff31913016155e38e474a2c06d08be276cf"},
                {"type":"ByteArray","value":"AQID"},
                {"type":"Boolean","value":"TRUE"}]"#,
        )
        .unwrap();
        assert_eq!(params[0], ContractParameter::Integer(42));
        assert_eq!(params[1].type_name(), "Hash160");
        assert_eq!(params[2], ContractParameter::ByteArray(vec![1, 2, 3]));
        assert_eq!(params[3], ContractParameter::Boolean(true));
    }

    #[test]
    fn test_bare_values() {
        let param = ContractParameter::from_json(&json!(["a", 7, null, false])).unwrap();
        assert_eq!(
            param,
            ContractParameter::Array(vec![
                ContractParameter::String("a".into()),
                ContractParameter::Integer(7),
                ContractParameter::Any,
                ContractParameter::Boolean(false),
            ])
        );
    }

    #[test]
    fn test_malformed_integer_is_encoding_error() {
        let err = ContractParameter::from_json(&json!({"type": "Integer", "value": "12abc"})).unwrap_err();
        assert!(matches!(err, ConsoleError::Encoding(ref m) if m.contains("Malformed integer literal")));
        assert!(parse_integer("1.5").is_err());
        assert_eq!(parse_integer("0x10").unwrap(), 16);
    }

    #[test]
    fn test_signed_hex_literal_rejected() {
        for literal in ["0x-5", "0x+5", "0x-"] {
            assert!(
                matches!(parse_integer(literal), Err(ConsoleError::Encoding(_))),
                "{}",
                literal
            );
        }
        let err = ContractParameter::from_json(&json!({"type": "Integer", "value": "0x-5"})).unwrap_err();
        assert!(matches!(err, ConsoleError::Encoding(_)));
        assert_eq!(parse_integer("-5").unwrap(), -5);
    }

    #[test]
    fn test_list_must_be_array() {
        assert!(parse_parameter_list("{\"type\":\"Any\"}").is_err());
        assert!(parse_parameter_list("[").is_err());
    }

    #[test]
    fn test_unknown_type() {
        let err = ContractParameter::from_json(&json!({"type": "Float", "value": 1})).unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }
}
