//! The in-memory network model
//!
//! A [`Network`] is the top-level owner of everything a DBC file describes:
//! nodes, value tables, messages with their signals, environment variables,
//! and the attribute system. Ownership is strictly hierarchical and
//! cross-references go by name, so the whole tree is `Clone + Send + Sync`
//! without any interior pointers.

pub mod attributes;
pub mod bit_timing;
mod codec;
pub mod env_var;
pub mod merge;
pub mod message;
pub mod node;
pub mod signal;
pub mod value_table;

pub use attributes::{
    Attribute, AttributeDefinition, AttributeObjectType, AttributeValue, AttributeValueType,
};
pub use bit_timing::BitTiming;
pub use env_var::{AccessType, EnvVarType, EnvironmentVariable};
pub use message::{Message, MessageErrorCode, SignalGroup, MESSAGE_ID_EXTENDED_FLAG};
pub use node::Node;
pub use signal::{
    ByteOrder, MultiplexerIndicator, MultiplexerRange, Signal, SignalBuilder, ValueType,
};
pub use value_table::{ValueEncoding, ValueTable};

use crate::network::message::set_eq;
use crate::types::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// A complete CAN network description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    pub(crate) version: String,
    pub(crate) new_symbols: Vec<String>,
    pub(crate) bit_timing: BitTiming,
    pub(crate) nodes: Vec<Node>,
    pub(crate) value_tables: Vec<ValueTable>,
    pub(crate) messages: Vec<Message>,
    pub(crate) environment_variables: Vec<EnvironmentVariable>,
    pub(crate) attribute_definitions: Vec<AttributeDefinition>,
    pub(crate) attribute_defaults: Vec<Attribute>,
    pub(crate) attribute_values: Vec<Attribute>,
    pub(crate) comment: String,
}

impl Network {
    /// Build a network from freshly constructed parts.
    ///
    /// Network-level attribute defaults and values must be network-scoped;
    /// anything else fails with an error naming the attribute. The nested
    /// entities were already validated by their own factories.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: String,
        new_symbols: Vec<String>,
        bit_timing: BitTiming,
        nodes: Vec<Node>,
        value_tables: Vec<ValueTable>,
        messages: Vec<Message>,
        environment_variables: Vec<EnvironmentVariable>,
        attribute_definitions: Vec<AttributeDefinition>,
        attribute_defaults: Vec<Attribute>,
        attribute_values: Vec<Attribute>,
        comment: String,
    ) -> Result<Self> {
        for attr in attribute_defaults.iter().chain(attribute_values.iter()) {
            if attr.object_type != AttributeObjectType::Network {
                return Err(NetworkError::AttributeObjectMismatch {
                    name: attr.name.clone(),
                    expected: attr.object_type,
                    actual: AttributeObjectType::Network,
                });
            }
        }
        Ok(Self {
            version,
            new_symbols,
            bit_timing,
            nodes,
            value_tables,
            messages,
            environment_variables,
            attribute_definitions,
            attribute_defaults,
            attribute_values,
            comment,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Symbols of the DBC `NS_` block
    pub fn new_symbols(&self) -> &[String] {
        &self.new_symbols
    }

    pub fn bit_timing(&self) -> &BitTiming {
        &self.bit_timing
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn value_tables(&self) -> &[ValueTable] {
        &self.value_tables
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn environment_variables(&self) -> &[EnvironmentVariable] {
        &self.environment_variables
    }

    pub fn attribute_definitions(&self) -> &[AttributeDefinition] {
        &self.attribute_definitions
    }

    pub fn attribute_defaults(&self) -> &[Attribute] {
        &self.attribute_defaults
    }

    pub fn attribute_values(&self) -> &[Attribute] {
        &self.attribute_values
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Find a message by its raw id (extended flag included).
    pub fn message_by_id(&self, id: u64) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Find a message by the identifier seen on the bus, ignoring the
    /// extended flag stored in the model.
    pub fn message_by_can_id(&self, can_id: u64) -> Option<&Message> {
        self.messages.iter().find(|m| m.can_id() == can_id)
    }

    pub fn message_by_name(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn value_table_by_name(&self, name: &str) -> Option<&ValueTable> {
        self.value_tables.iter().find(|t| t.name == name)
    }

    pub fn environment_variable_by_name(&self, name: &str) -> Option<&EnvironmentVariable> {
        self.environment_variables.iter().find(|v| v.name == name)
    }

    /// Find an attribute definition by object type and name.
    pub fn attribute_definition(
        &self,
        object_type: AttributeObjectType,
        name: &str,
    ) -> Option<&AttributeDefinition> {
        self.attribute_definitions
            .iter()
            .find(|d| d.object_type == object_type && d.name == name)
    }
}

/// Set-equality over every collection, scalar equality over leaf fields.
impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.bit_timing == other.bit_timing
            && self.comment == other.comment
            && set_eq(&self.new_symbols, &other.new_symbols)
            && set_eq(&self.nodes, &other.nodes)
            && set_eq(&self.value_tables, &other.value_tables)
            && set_eq(&self.messages, &other.messages)
            && set_eq(&self.environment_variables, &other.environment_variables)
            && set_eq(&self.attribute_definitions, &other.attribute_definitions)
            && set_eq(&self.attribute_defaults, &other.attribute_defaults)
            && set_eq(&self.attribute_values, &other.attribute_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_network_attribute() {
        let attr = Attribute {
            name: "GenSigStartValue".to_string(),
            object_type: AttributeObjectType::Signal,
            value: AttributeValue::Int(0),
        };
        let result = Network::new(
            String::new(),
            Vec::new(),
            BitTiming::default(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![attr],
            String::new(),
        );
        assert!(result.is_err());
        assert!(format!("{}", result.unwrap_err()).contains("GenSigStartValue"));
    }

    #[test]
    fn test_equality_ignores_collection_order() {
        let node = |name: &str| Node::new(name.to_string(), String::new(), Vec::new()).unwrap();
        let a = Network::new(
            "1.0".to_string(),
            Vec::new(),
            BitTiming::default(),
            vec![node("ECU1"), node("ECU2")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
        )
        .unwrap();
        let b = Network::new(
            "1.0".to_string(),
            Vec::new(),
            BitTiming::default(),
            vec![node("ECU2"), node("ECU1")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
