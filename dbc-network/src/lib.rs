//! DBC Network Library
//!
//! An in-memory model of DBC CAN databases with a bit-level signal decode
//! engine, multiplex resolution, and a merge operation for overlapping
//! networks.
//!
//! # Architecture
//!
//! This library is intentionally focused on the network model and frame
//! decoding:
//! - Owns the validated data model (network, messages, signals, attributes)
//! - Decodes and encodes signal bit fields in both byte orders
//! - Resolves simple and extended multiplexing per payload
//! - Merges two networks describing overlapping buses
//! - Loads `.dbc` files through the `can-dbc` grammar crate
//! - Serializes a network back to DBC text, a C header, or a readable dump
//!
//! The library does NOT:
//! - Transmit or arbitrate CAN frames
//! - Handle CAN-FD payloads beyond the classic 8 bytes
//! - Reassemble ISO-TP transport messages
//!
//! The candump-style frontend lives in the application crate
//! (dbc-network-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use dbc_network::{frame_decoder, load_network_from_file};
//! use std::path::Path;
//!
//! let network = load_network_from_file(Path::new("powertrain.dbc"))
//!     .unwrap()
//!     .expect("no network loaded");
//!
//! let payload = [0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
//! if let Some(message) = network.message_by_can_id(0x123) {
//!     for signal in frame_decoder::decode_frame(message, &payload) {
//!         println!("{}", signal);
//!     }
//! }
//! ```

// Public modules
pub mod dbc;
pub mod frame_decoder;
pub mod network;
pub mod serialize;
pub mod types;

// Re-export main types for convenience
pub use dbc::{load_network_from_file, parse_dbc};
pub use network::{
    Attribute, AttributeDefinition, AttributeObjectType, AttributeValue, AttributeValueType,
    BitTiming, ByteOrder, EnvironmentVariable, Message, MessageErrorCode, MultiplexerIndicator,
    MultiplexerRange, Network, Node, Signal, SignalGroup, ValueEncoding, ValueTable, ValueType,
};
pub use types::{DecodedSignal, NetworkError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
