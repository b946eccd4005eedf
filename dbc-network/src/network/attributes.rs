//! User attributes (the DBC `BA_DEF_` / `BA_DEF_DEF_` / `BA_` sections)
//!
//! Attributes decorate networks, nodes, messages, signals, and environment
//! variables with typed user metadata. The definition carries the schema;
//! a concrete [`Attribute`] is a tagged value validated against it.

use crate::types::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// The kind of entity an attribute definition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeObjectType {
    Network,
    Node,
    Message,
    Signal,
    EnvironmentVariable,
}

/// Attribute value schema as declared by `BA_DEF_` lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValueType {
    Int { min: i64, max: i64 },
    Hex { min: u64, max: u64 },
    Float { min: f64, max: f64 },
    Text,
    Enum(Vec<String>),
}

/// A concrete attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Index into the definition's enumerator list
    EnumIndex(usize),
}

/// Attribute definition (declared by `BA_DEF_`).
///
/// Identity is the `(object_type, name)` pair; two definitions with the same
/// name may coexist for different object types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub object_type: AttributeObjectType,
    pub value_type: AttributeValueType,
}

impl AttributeDefinition {
    pub fn new(name: String, object_type: AttributeObjectType, value_type: AttributeValueType) -> Self {
        Self {
            name,
            object_type,
            value_type,
        }
    }

    /// Build an attribute of this definition, validating the value against
    /// the schema. This is the only validated path from a raw value to an
    /// [`Attribute`].
    pub fn instantiate(&self, value: AttributeValue) -> Result<Attribute> {
        self.check(&value)?;
        Ok(Attribute {
            name: self.name.clone(),
            object_type: self.object_type,
            value,
        })
    }

    /// Validate a value against the schema without constructing anything.
    pub fn check(&self, value: &AttributeValue) -> Result<()> {
        let fail = |reason: String| {
            Err(NetworkError::AttributeValueMismatch {
                name: self.name.clone(),
                reason,
            })
        };
        match (&self.value_type, value) {
            (AttributeValueType::Int { min, max }, AttributeValue::Int(v)) => {
                if (min..=max).contains(&v) {
                    Ok(())
                } else {
                    fail(format!("integer {} outside [{}..{}]", v, min, max))
                }
            }
            (AttributeValueType::Hex { min, max }, AttributeValue::Int(v)) => {
                let v = *v as u64;
                if (*min..=*max).contains(&v) {
                    Ok(())
                } else {
                    fail(format!("hex value {} outside [{}..{}]", v, min, max))
                }
            }
            (AttributeValueType::Float { min, max }, AttributeValue::Float(v)) => {
                if (min..=max).contains(&v) {
                    Ok(())
                } else {
                    fail(format!("float {} outside [{}..{}]", v, min, max))
                }
            }
            // DBC writers routinely store integral floats as integers
            (AttributeValueType::Float { min, max }, AttributeValue::Int(v)) => {
                let v = *v as f64;
                if (*min..=*max).contains(&v) {
                    Ok(())
                } else {
                    fail(format!("float {} outside [{}..{}]", v, min, max))
                }
            }
            (AttributeValueType::Text, AttributeValue::Text(_)) => Ok(()),
            (AttributeValueType::Enum(values), AttributeValue::EnumIndex(idx)) => {
                if *idx < values.len() {
                    Ok(())
                } else {
                    fail(format!(
                        "enum index {} outside the {} declared enumerators",
                        idx,
                        values.len()
                    ))
                }
            }
            (expected, got) => fail(format!("expected {:?}, got {:?}", expected, got)),
        }
    }

    /// Resolve an enumerator name to an [`AttributeValue::EnumIndex`].
    pub fn enum_index_of(&self, label: &str) -> Option<AttributeValue> {
        match &self.value_type {
            AttributeValueType::Enum(values) => values
                .iter()
                .position(|v| v == label)
                .map(AttributeValue::EnumIndex),
            _ => None,
        }
    }
}

/// A concrete attribute attached to an entity.
///
/// Carries its scope so hosting entities can reject foreign attributes at
/// construction; the definition is referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub object_type: AttributeObjectType,
    pub value: AttributeValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_time_def() -> AttributeDefinition {
        AttributeDefinition::new(
            "GenMsgCycleTime".to_string(),
            AttributeObjectType::Message,
            AttributeValueType::Int { min: 0, max: 65535 },
        )
    }

    #[test]
    fn test_int_in_range() {
        let attr = cycle_time_def().instantiate(AttributeValue::Int(100)).unwrap();
        assert_eq!(attr.value, AttributeValue::Int(100));
        assert_eq!(attr.object_type, AttributeObjectType::Message);
    }

    #[test]
    fn test_int_out_of_range() {
        let err = cycle_time_def()
            .instantiate(AttributeValue::Int(70000))
            .unwrap_err();
        assert!(format!("{}", err).contains("GenMsgCycleTime"));
    }

    #[test]
    fn test_kind_mismatch() {
        assert!(cycle_time_def()
            .instantiate(AttributeValue::Text("fast".to_string()))
            .is_err());
    }

    #[test]
    fn test_enum_index_bounds() {
        let def = AttributeDefinition::new(
            "BusType".to_string(),
            AttributeObjectType::Network,
            AttributeValueType::Enum(vec!["CAN".to_string(), "CAN FD".to_string()]),
        );
        assert!(def.instantiate(AttributeValue::EnumIndex(1)).is_ok());
        assert!(def.instantiate(AttributeValue::EnumIndex(2)).is_err());
        assert_eq!(
            def.enum_index_of("CAN FD"),
            Some(AttributeValue::EnumIndex(1))
        );
        assert_eq!(def.enum_index_of("LIN"), None);
    }

    #[test]
    fn test_float_accepts_integer_literal() {
        let def = AttributeDefinition::new(
            "SamplePoint".to_string(),
            AttributeObjectType::Network,
            AttributeValueType::Float { min: 0.0, max: 1.0 },
        );
        assert!(def.instantiate(AttributeValue::Int(1)).is_ok());
        assert!(def.instantiate(AttributeValue::Float(1.5)).is_err());
    }
}
