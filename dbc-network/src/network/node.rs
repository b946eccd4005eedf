//! Network nodes (ECUs, the DBC `BU_` section)

use crate::network::attributes::{Attribute, AttributeObjectType};
use crate::types::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// An ECU participating in the network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node name (unique within the network)
    pub name: String,
    /// Associated comment (DBC `CM_ BU_` section)
    pub comment: String,
    /// Node-scoped attribute values
    pub attributes: Vec<Attribute>,
}

impl Node {
    /// Create a node, validating that every attribute is node-scoped.
    pub fn new(name: String, comment: String, attributes: Vec<Attribute>) -> Result<Self> {
        for attr in &attributes {
            if attr.object_type != AttributeObjectType::Node {
                return Err(NetworkError::AttributeObjectMismatch {
                    name: attr.name.clone(),
                    expected: attr.object_type,
                    actual: AttributeObjectType::Node,
                });
            }
        }
        Ok(Self {
            name,
            comment,
            attributes,
        })
    }
}
