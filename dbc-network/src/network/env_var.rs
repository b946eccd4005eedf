//! Environment variables (the DBC `EV_` section)
//!
//! Environment variables are named out-of-frame values used by restbus
//! simulation tools. They take no part in frame decoding but round-trip
//! through the model and the DBC emitter.

use crate::network::attributes::{Attribute, AttributeObjectType};
use crate::network::value_table::ValueEncoding;
use crate::types::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// Data kind of an environment variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvVarType {
    #[default]
    Integer,
    Float,
    /// Opaque byte payload (`ENVVAR_DATA_`)
    Data,
}

/// Node access restriction of an environment variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    #[default]
    Unrestricted,
    Read,
    Write,
    ReadWrite,
}

/// A named out-of-frame variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// Variable name (unique within the network)
    pub name: String,
    pub var_type: EnvVarType,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit
    pub unit: String,
    pub initial_value: f64,
    /// Numeric id carried by the `EV_` entry
    pub ev_id: u64,
    pub access_type: AccessType,
    /// Nodes allowed to access the variable, by name
    pub access_nodes: Vec<String>,
    /// Value-to-label mapping (DBC `VAL_` on the variable)
    pub encodings: Vec<ValueEncoding>,
    /// Associated comment (DBC `CM_ EV_` section)
    pub comment: String,
    /// Variable-scoped attribute values
    pub attributes: Vec<Attribute>,
}

impl EnvironmentVariable {
    /// Validate that every attached attribute is scoped to environment
    /// variables. Field population is plain struct update; only the
    /// attribute scope can fail.
    pub fn validate(self) -> Result<Self> {
        for attr in &self.attributes {
            if attr.object_type != AttributeObjectType::EnvironmentVariable {
                return Err(NetworkError::AttributeObjectMismatch {
                    name: attr.name.clone(),
                    expected: attr.object_type,
                    actual: AttributeObjectType::EnvironmentVariable,
                });
            }
        }
        Ok(self)
    }
}
