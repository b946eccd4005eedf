//! Human-readable dump
//!
//! An indented rendition for debugging; makes no round-trip promise.

use crate::network::{ByteOrder, MultiplexerIndicator, Network, ValueType};
use std::fmt::Write;

/// Serialize a network into an indented, human-oriented listing.
pub fn network_to_human(network: &Network) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Network");
    if !network.version().is_empty() {
        let _ = writeln!(out, "  Version: {}", network.version());
    }
    if !network.comment().is_empty() {
        let _ = writeln!(out, "  Comment: {}", network.comment());
    }
    if !network.bit_timing().is_empty() {
        let timing = network.bit_timing();
        let _ = writeln!(
            out,
            "  BitTiming: {} bit/s (BTR1 {}, BTR2 {})",
            timing.baudrate, timing.btr1, timing.btr2
        );
    }

    if !network.nodes().is_empty() {
        let _ = writeln!(out, "  Nodes:");
        for node in network.nodes() {
            let _ = write!(out, "    {}", node.name);
            if !node.comment.is_empty() {
                let _ = write!(out, "  -- {}", node.comment);
            }
            out.push('\n');
        }
    }

    for message in network.messages() {
        let extended = if message.is_extended() { " ext" } else { "" };
        let _ = writeln!(
            out,
            "  Message: {} (0x{:X}{}) {} bytes, transmitter {}",
            message.name(),
            message.can_id(),
            extended,
            message.size(),
            if message.transmitter().is_empty() {
                "-"
            } else {
                message.transmitter()
            }
        );
        for signal in message.signals() {
            let order = match signal.byte_order() {
                ByteOrder::LittleEndian => "le",
                ByteOrder::BigEndian => "be",
            };
            let value_type = match signal.value_type() {
                ValueType::Unsigned => "unsigned",
                ValueType::Signed => "signed",
                ValueType::IeeeFloat32 => "float32",
                ValueType::IeeeFloat64 => "float64",
            };
            let mux = match signal.multiplexer_indicator() {
                MultiplexerIndicator::None => String::new(),
                MultiplexerIndicator::MuxSwitch => " [mux switch]".to_string(),
                MultiplexerIndicator::MuxValue => {
                    format!(" [mux {}]", signal.multiplexer_switch_value())
                }
            };
            let _ = writeln!(
                out,
                "    Signal: {} @{}+{} {} {}{} factor {} offset {} [{}|{}] \"{}\"",
                signal.name(),
                signal.start_bit(),
                signal.bit_size(),
                order,
                value_type,
                mux,
                signal.factor(),
                signal.offset(),
                signal.min(),
                signal.max(),
                signal.unit()
            );
            for encoding in signal.encodings() {
                let _ = writeln!(
                    out,
                    "      {} = \"{}\"",
                    encoding.value, encoding.description
                );
            }
        }
    }

    for var in network.environment_variables() {
        let _ = writeln!(
            out,
            "  EnvironmentVariable: {} ({:?}) [{}|{}] \"{}\"",
            var.name, var.var_type, var.min, var.max, var.unit
        );
    }

    out
}
