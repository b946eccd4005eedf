//! Message definitions (the DBC `BO_` section)
//!
//! A message owns its signals, signal groups, and message-scoped attributes.
//! Two derived views are maintained across construction and merge: the index
//! of the multiplexer switch signal and the soft-error bitset.

use crate::network::attributes::{Attribute, AttributeObjectType};
use crate::network::signal::{MultiplexerIndicator, Signal};
use crate::types::{NetworkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bit in a message id marking a 29-bit extended identifier.
pub const MESSAGE_ID_EXTENDED_FLAG: u64 = 1 << 31;

/// Soft validity issues recorded while a message is built.
///
/// These do not prevent construction; callers query them explicitly and may
/// still decode from a flagged message at their own risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u64)]
pub enum MessageErrorCode {
    /// The sentinel: true when no flag is set
    NoError = 0,
    /// A multiplexed signal exists but no signal is the switch
    MuxValueWithoutMuxSignal = 1,
    /// Two signals share a name
    SignalNameDuplicated = 2,
}

/// A named group of signals within one message (the DBC `SIG_GROUP_`
/// section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalGroup {
    /// Id of the message the group belongs to
    pub message_id: u64,
    /// Group name (unique within the message)
    pub name: String,
    pub repetitions: u64,
    /// Member signals, by name
    pub signal_names: Vec<String>,
}

impl SignalGroup {
    pub fn new(message_id: u64, name: String, repetitions: u64, signal_names: Vec<String>) -> Self {
        Self {
            message_id,
            name,
            repetitions,
            signal_names,
        }
    }
}

/// One CAN frame layout: an identifier plus the signals packed into its
/// payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) transmitter: String,
    pub(crate) message_transmitters: Vec<String>,
    pub(crate) signals: Vec<Signal>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) comment: String,
    pub(crate) signal_groups: Vec<SignalGroup>,
    // Derived views, recomputed by refresh_derived() after every mutation
    pub(crate) mux_signal: Option<usize>,
    pub(crate) errors: u64,
}

impl Message {
    /// Build a message from freshly constructed parts.
    ///
    /// Fails when a message-scoped attribute or a signal group of another
    /// message is attached; signal-level problems (duplicate names, orphaned
    /// multiplexed signals) are recorded as soft errors instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        name: String,
        size: u64,
        transmitter: String,
        message_transmitters: Vec<String>,
        signals: Vec<Signal>,
        attributes: Vec<Attribute>,
        comment: String,
        signal_groups: Vec<SignalGroup>,
    ) -> Result<Self> {
        for attr in &attributes {
            if attr.object_type != AttributeObjectType::Message {
                return Err(NetworkError::AttributeObjectMismatch {
                    name: attr.name.clone(),
                    expected: attr.object_type,
                    actual: AttributeObjectType::Message,
                });
            }
        }
        for group in &signal_groups {
            if group.message_id != id {
                return Err(NetworkError::ForeignSignalGroup {
                    name: group.name.clone(),
                    group_message_id: group.message_id,
                    message_id: id,
                });
            }
        }
        let mut message = Self {
            id,
            name,
            size,
            transmitter,
            message_transmitters,
            signals,
            attributes,
            comment,
            signal_groups,
            mux_signal: None,
            errors: 0,
        };
        message.refresh_derived();
        Ok(message)
    }

    /// Raw id with the extended-identifier flag in the high bit.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bus identifier without the extended flag.
    pub fn can_id(&self) -> u64 {
        self.id & !MESSAGE_ID_EXTENDED_FLAG
    }

    /// True for 29-bit extended identifiers.
    pub fn is_extended(&self) -> bool {
        self.id & MESSAGE_ID_EXTENDED_FLAG != 0
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn transmitter(&self) -> &str {
        &self.transmitter
    }

    /// Additional transmitters (the DBC `BO_TX_BU_` section)
    pub fn message_transmitters(&self) -> &[String] {
        &self.message_transmitters
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn signal_groups(&self) -> &[SignalGroup] {
        &self.signal_groups
    }

    /// Find an owned signal by name.
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// The multiplexer switch signal, if the message has one.
    ///
    /// A query cache over the signal list; `None` iff no signal carries the
    /// switch indicator.
    pub fn mux_signal(&self) -> Option<&Signal> {
        self.mux_signal.map(|i| &self.signals[i])
    }

    /// Query a soft-error flag. `NoError` answers "is the set empty".
    pub fn error(&self, code: MessageErrorCode) -> bool {
        match code {
            MessageErrorCode::NoError => self.errors == 0,
            code => self.errors & code as u64 != 0,
        }
    }

    fn set_error(&mut self, code: MessageErrorCode) {
        self.errors |= code as u64;
    }

    /// Recompute the mux-switch index and the error bitset from scratch.
    ///
    /// Called after construction and after merge; the cached index must
    /// never survive a signal-list mutation.
    pub(crate) fn refresh_derived(&mut self) {
        self.mux_signal = None;
        self.errors = 0;
        let mut have_mux_value = false;
        for (index, signal) in self.signals.iter().enumerate() {
            match signal.multiplexer_indicator() {
                MultiplexerIndicator::MuxValue => have_mux_value = true,
                MultiplexerIndicator::MuxSwitch => self.mux_signal = Some(index),
                MultiplexerIndicator::None => {}
            }
        }
        if have_mux_value && self.mux_signal.is_none() {
            self.set_error(MessageErrorCode::MuxValueWithoutMuxSignal);
        }

        let mut names = HashSet::new();
        if self.signals.iter().any(|s| !names.insert(s.name())) {
            self.set_error(MessageErrorCode::SignalNameDuplicated);
        }
    }
}

/// Set-equality over the owned collections, scalar equality elsewhere.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.size == other.size
            && self.transmitter == other.transmitter
            && self.comment == other.comment
            && set_eq(&self.message_transmitters, &other.message_transmitters)
            && set_eq(&self.signals, &other.signals)
            && set_eq(&self.attributes, &other.attributes)
            && set_eq(&self.signal_groups, &other.signal_groups)
    }
}

/// Order-insensitive equality of two collections with unique keys.
pub(crate) fn set_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::attributes::AttributeValue;

    fn signal(name: &str, start: u64) -> Signal {
        Signal::builder(name)
            .start_bit(start)
            .bit_size(8)
            .build()
            .unwrap()
    }

    #[test]
    fn test_clean_message_has_no_errors() {
        let msg = Message::new(
            100,
            "EngineData".to_string(),
            8,
            "ECU1".to_string(),
            Vec::new(),
            vec![signal("A", 0), signal("B", 8)],
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap();
        assert!(msg.error(MessageErrorCode::NoError));
        assert!(msg.mux_signal().is_none());
    }

    #[test]
    fn test_mux_switch_is_cached() {
        let switch = Signal::builder("Mode")
            .start_bit(0)
            .bit_size(4)
            .mux_switch()
            .build()
            .unwrap();
        let muxed = Signal::builder("A")
            .start_bit(8)
            .bit_size(8)
            .mux_value(1)
            .build()
            .unwrap();
        let msg = Message::new(
            100,
            "M".to_string(),
            8,
            String::new(),
            Vec::new(),
            vec![switch, muxed],
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(msg.mux_signal().unwrap().name(), "Mode");
        assert!(msg.error(MessageErrorCode::NoError));
    }

    #[test]
    fn test_orphaned_mux_value_sets_flag() {
        let muxed = Signal::builder("A")
            .start_bit(8)
            .bit_size(8)
            .mux_value(1)
            .build()
            .unwrap();
        let msg = Message::new(
            100,
            "M".to_string(),
            8,
            String::new(),
            Vec::new(),
            vec![muxed],
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap();
        assert!(msg.error(MessageErrorCode::MuxValueWithoutMuxSignal));
        assert!(!msg.error(MessageErrorCode::NoError));
        assert!(!msg.error(MessageErrorCode::SignalNameDuplicated));
    }

    #[test]
    fn test_duplicate_signal_names_set_flag() {
        let msg = Message::new(
            100,
            "M".to_string(),
            8,
            String::new(),
            Vec::new(),
            vec![signal("A", 0), signal("A", 8)],
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap();
        assert!(msg.error(MessageErrorCode::SignalNameDuplicated));
    }

    #[test]
    fn test_rejects_network_attribute() {
        let attr = Attribute {
            name: "DBName".to_string(),
            object_type: AttributeObjectType::Network,
            value: AttributeValue::Text("net".to_string()),
        };
        let result = Message::new(
            100,
            "M".to_string(),
            8,
            String::new(),
            Vec::new(),
            Vec::new(),
            vec![attr],
            String::new(),
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_foreign_signal_group() {
        let group = SignalGroup::new(200, "Group".to_string(), 1, vec!["A".to_string()]);
        let result = Message::new(
            100,
            "M".to_string(),
            8,
            String::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
            vec![group],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extended_flag() {
        let msg = Message::new(
            0x18FF50E5 | MESSAGE_ID_EXTENDED_FLAG,
            "J1939".to_string(),
            8,
            String::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap();
        assert!(msg.is_extended());
        assert_eq!(msg.can_id(), 0x18FF50E5);
    }
}
