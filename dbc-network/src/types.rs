//! Core types for the DBC network library
//!
//! This module defines the error surface of the library and the types the
//! frame decoder emits. Construction errors prevent an entity from being
//! created; recoverable validity issues live on the message error bitset
//! instead (see [`crate::network::message`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors that can occur while building or loading a network
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Invalid signal definition '{name}': {reason}")]
    InvalidSignalDefinition { name: String, reason: String },

    #[error("Attribute '{name}' is scoped to {expected:?} objects and cannot be attached to a {actual:?}")]
    AttributeObjectMismatch {
        name: String,
        expected: crate::network::attributes::AttributeObjectType,
        actual: crate::network::attributes::AttributeObjectType,
    },

    #[error("Attribute '{name}' does not conform to its definition: {reason}")]
    AttributeValueMismatch { name: String, reason: String },

    #[error("Signal group '{name}' belongs to message {group_message_id} but was attached to message {message_id}")]
    ForeignSignalGroup {
        name: String,
        group_message_id: u64,
        message_id: u64,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A decoded signal with its physical value
///
/// Produced by the frame decoder for every signal that is present in a
/// payload after multiplex resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSignal {
    /// Signal name from the database
    pub name: String,
    /// Physical value after factor/offset scaling
    pub physical: f64,
    /// Engineering unit (empty if the signal has none)
    pub unit: String,
    /// Value-encoding label matching the raw value, if any
    pub label: Option<String>,
    /// Raw value before scaling (sign-extended bit pattern for signed signals)
    pub raw: u64,
}

impl fmt::Display for DecodedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => {
                write!(f, "{}: '{}'", self.name, label)?;
                if !self.unit.is_empty() {
                    write!(f, " {}", self.unit)?;
                }
            }
            None => {
                write!(f, "{}: {}", self.name, self.physical)?;
                if !self.unit.is_empty() {
                    write!(f, " {}", self.unit)?;
                }
            }
        }
        Ok(())
    }
}
