//! Signal definitions (the DBC `SG_` section)
//!
//! A signal is a named bit field inside a message payload, with byte order,
//! sign, linear scaling, optional multiplexing, value encodings, and
//! attributes. Signals are built through [`SignalBuilder`], which is the
//! validation point for every bit-layout invariant; the bit-level decode and
//! encode routines live in [`crate::network::codec`].

use crate::network::attributes::{Attribute, AttributeObjectType};
use crate::network::value_table::ValueEncoding;
use crate::types::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// Byte order of a signal's bit field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Intel format: start bit is the LSB, field grows upward
    #[default]
    LittleEndian,
    /// Motorola format: start bit is the MSB, sawtooth bit numbering
    BigEndian,
}

/// Interpretation of the extracted raw bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    #[default]
    Unsigned,
    Signed,
    /// IEEE 754 single precision bit pattern (bit size must be 32)
    IeeeFloat32,
    /// IEEE 754 double precision bit pattern (bit size must be 64)
    IeeeFloat64,
}

/// Multiplexing role of a signal within its message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiplexerIndicator {
    /// Always present
    #[default]
    None,
    /// The switch: its decoded value selects which multiplexed signals apply
    MuxSwitch,
    /// Present only for matching switch values
    MuxValue,
}

/// One extended-multiplex presence condition (`SG_MUL_VAL_`).
///
/// The signal is present when the signal named `switch_name` decodes into
/// the closed interval `[from, to]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplexerRange {
    pub switch_name: String,
    pub from: u64,
    pub to: u64,
}

impl MultiplexerRange {
    pub fn new(switch_name: String, from: u64, to: u64) -> Self {
        Self { switch_name, from, to }
    }

    pub fn contains(&self, raw: u64) -> bool {
        self.from <= raw && raw <= self.to
    }
}

/// A bit-packed field inside a message payload.
///
/// Fields are fixed at construction; merge is the only mutation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub(crate) name: String,
    pub(crate) multiplexer_indicator: MultiplexerIndicator,
    pub(crate) multiplexer_switch_value: u64,
    pub(crate) start_bit: u64,
    pub(crate) bit_size: u64,
    pub(crate) byte_order: ByteOrder,
    pub(crate) value_type: ValueType,
    pub(crate) factor: f64,
    pub(crate) offset: f64,
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) unit: String,
    pub(crate) receivers: Vec<String>,
    pub(crate) encodings: Vec<ValueEncoding>,
    pub(crate) multiplexer_ranges: Vec<MultiplexerRange>,
    pub(crate) comment: String,
    pub(crate) attributes: Vec<Attribute>,
}

impl Signal {
    /// Start building a signal. Scaling defaults to identity
    /// (factor 1, offset 0), byte order to little-endian, value type to
    /// unsigned.
    pub fn builder(name: &str) -> SignalBuilder {
        SignalBuilder {
            signal: Signal {
                name: name.to_string(),
                multiplexer_indicator: MultiplexerIndicator::None,
                multiplexer_switch_value: 0,
                start_bit: 0,
                bit_size: 1,
                byte_order: ByteOrder::LittleEndian,
                value_type: ValueType::Unsigned,
                factor: 1.0,
                offset: 0.0,
                min: 0.0,
                max: 0.0,
                unit: String::new(),
                receivers: Vec::new(),
                encodings: Vec::new(),
                multiplexer_ranges: Vec::new(),
                comment: String::new(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn multiplexer_indicator(&self) -> MultiplexerIndicator {
        self.multiplexer_indicator
    }

    pub fn multiplexer_switch_value(&self) -> u64 {
        self.multiplexer_switch_value
    }

    pub fn start_bit(&self) -> u64 {
        self.start_bit
    }

    pub fn bit_size(&self) -> u64 {
        self.bit_size
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn receivers(&self) -> &[String] {
        &self.receivers
    }

    pub fn encodings(&self) -> &[ValueEncoding] {
        &self.encodings
    }

    pub fn multiplexer_ranges(&self) -> &[MultiplexerRange] {
        &self.multiplexer_ranges
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up the value-encoding label for a raw value.
    pub fn describe(&self, raw: u64) -> Option<&str> {
        self.encodings
            .iter()
            .find(|e| e.value == raw)
            .map(|e| e.description.as_str())
    }
}

/// Builder for [`Signal`]; `build` is where every layout invariant is
/// checked.
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    signal: Signal,
}

impl SignalBuilder {
    pub fn start_bit(mut self, start_bit: u64) -> Self {
        self.signal.start_bit = start_bit;
        self
    }

    pub fn bit_size(mut self, bit_size: u64) -> Self {
        self.signal.bit_size = bit_size;
        self
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.signal.byte_order = byte_order;
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.signal.value_type = value_type;
        self
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.signal.factor = factor;
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.signal.offset = offset;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.signal.min = min;
        self.signal.max = max;
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.signal.unit = unit.to_string();
        self
    }

    /// Append a receiver node, keeping the list unique and ordered.
    pub fn receiver(mut self, node: &str) -> Self {
        if !self.signal.receivers.iter().any(|r| r == node) {
            self.signal.receivers.push(node.to_string());
        }
        self
    }

    pub fn receivers(mut self, nodes: Vec<String>) -> Self {
        for node in nodes {
            if !self.signal.receivers.contains(&node) {
                self.signal.receivers.push(node);
            }
        }
        self
    }

    /// Mark the signal as the message's multiplexer switch.
    pub fn mux_switch(mut self) -> Self {
        self.signal.multiplexer_indicator = MultiplexerIndicator::MuxSwitch;
        self
    }

    /// Mark the signal as multiplexed under the given switch value.
    pub fn mux_value(mut self, switch_value: u64) -> Self {
        self.signal.multiplexer_indicator = MultiplexerIndicator::MuxValue;
        self.signal.multiplexer_switch_value = switch_value;
        self
    }

    pub fn encoding(mut self, value: u64, description: &str) -> Self {
        self.signal
            .encodings
            .push(ValueEncoding::new(value, description.to_string()));
        self
    }

    pub fn encodings(mut self, encodings: Vec<ValueEncoding>) -> Self {
        self.signal.encodings = encodings;
        self
    }

    /// Add an extended-multiplex presence range.
    pub fn mux_range(mut self, switch_name: &str, from: u64, to: u64) -> Self {
        self.signal
            .multiplexer_ranges
            .push(MultiplexerRange::new(switch_name.to_string(), from, to));
        self
    }

    pub fn mux_ranges(mut self, ranges: Vec<MultiplexerRange>) -> Self {
        self.signal.multiplexer_ranges = ranges;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.signal.comment = comment.to_string();
        self
    }

    pub fn attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.signal.attributes = attributes;
        self
    }

    /// Validate the layout and produce the signal.
    pub fn build(self) -> Result<Signal> {
        let sig = self.signal;
        let fail = |reason: String| {
            Err(NetworkError::InvalidSignalDefinition {
                name: sig.name.clone(),
                reason,
            })
        };

        if sig.bit_size == 0 || sig.bit_size > 64 {
            return fail(format!(
                "bit size must be between 1 and 64, got {}",
                sig.bit_size
            ));
        }
        match sig.value_type {
            ValueType::IeeeFloat32 if sig.bit_size != 32 => {
                return fail(format!(
                    "IEEE float32 signals need a bit size of 32, got {}",
                    sig.bit_size
                ));
            }
            ValueType::IeeeFloat64 if sig.bit_size != 64 => {
                return fail(format!(
                    "IEEE float64 signals need a bit size of 64, got {}",
                    sig.bit_size
                ));
            }
            _ => {}
        }
        match sig.byte_order {
            ByteOrder::LittleEndian => {
                if sig.start_bit + sig.bit_size > 64 {
                    return fail(format!(
                        "bits {}..{} do not fit an 8-byte payload",
                        sig.start_bit,
                        sig.start_bit + sig.bit_size - 1
                    ));
                }
            }
            ByteOrder::BigEndian => {
                if sig.start_bit > 63 {
                    return fail(format!(
                        "start bit {} outside an 8-byte payload",
                        sig.start_bit
                    ));
                }
                // Linear position of the MSB after byte reversal; the field
                // must not run past bit 0 of the reversed word.
                let msb = 8 * (7 - sig.start_bit / 8) + (sig.start_bit % 8);
                if sig.bit_size > msb + 1 {
                    return fail(format!(
                        "{} bits starting at Motorola bit {} run past the end of the payload",
                        sig.bit_size, sig.start_bit
                    ));
                }
            }
        }
        for attr in &sig.attributes {
            if attr.object_type != AttributeObjectType::Signal {
                return Err(NetworkError::AttributeObjectMismatch {
                    name: attr.name.clone(),
                    expected: attr.object_type,
                    actual: AttributeObjectType::Signal,
                });
            }
        }
        Ok(sig)
    }
}
