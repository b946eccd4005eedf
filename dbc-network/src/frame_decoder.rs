//! Whole-frame decoding
//!
//! Resolves which signals of a message are present for a given payload
//! (multiplex resolution) and decodes each present signal into a
//! [`DecodedSignal`]. The resolution rules:
//!
//! 1. Non-multiplexed signals are always present.
//! 2. A multiplexed signal without extended ranges is present iff the
//!    message's switch decodes to the signal's switch value.
//! 3. A signal with extended ranges is present iff any range's switch
//!    signal decodes into the range and, when that switch is itself
//!    multiplexed by ranges, it is recursively present. Repetition of a
//!    switch name along one resolution path means "not present".

use crate::network::message::Message;
use crate::network::signal::{MultiplexerIndicator, Signal};
use crate::types::DecodedSignal;

/// True when `signal` is carried by this payload of `message`.
pub fn is_signal_active(message: &Message, signal: &Signal, data: &[u8; 8]) -> bool {
    match signal.multiplexer_indicator() {
        MultiplexerIndicator::None | MultiplexerIndicator::MuxSwitch => true,
        MultiplexerIndicator::MuxValue => {
            if signal.multiplexer_ranges().is_empty() {
                match message.mux_signal() {
                    Some(switch) => switch.decode(data) == signal.multiplexer_switch_value(),
                    None => false,
                }
            } else {
                let mut path = Vec::new();
                ranges_active(message, signal, data, &mut path)
            }
        }
    }
}

/// Extended-range presence check, recursing through multi-level switch
/// chains. `path` holds the signal names already visited along this
/// resolution path; seeing one again is a cycle and yields false.
fn ranges_active<'a>(
    message: &'a Message,
    signal: &'a Signal,
    data: &[u8; 8],
    path: &mut Vec<&'a str>,
) -> bool {
    if path.contains(&signal.name()) {
        log::warn!(
            "multiplexer chain cycle at signal '{}' in message '{}'",
            signal.name(),
            message.name()
        );
        return false;
    }
    path.push(signal.name());

    for range in signal.multiplexer_ranges() {
        let Some(switch) = message.signal(&range.switch_name) else {
            continue;
        };
        if range.contains(switch.decode(data)) {
            if switch.multiplexer_ranges().is_empty() {
                return true;
            }
            if ranges_active(message, switch, data, path) {
                return true;
            }
        }
    }
    false
}

/// Decode every signal the payload carries.
///
/// Returns one entry per present signal in definition order, with the
/// value-encoding label resolved where the raw value matches one.
pub fn decode_frame(message: &Message, data: &[u8; 8]) -> Vec<DecodedSignal> {
    message
        .signals()
        .iter()
        .filter(|signal| is_signal_active(message, signal, data))
        .map(|signal| decode_signal(signal, data))
        .collect()
}

fn decode_signal(signal: &Signal, data: &[u8; 8]) -> DecodedSignal {
    let raw = signal.decode(data);
    DecodedSignal {
        name: signal.name().to_string(),
        physical: signal.raw_to_phys(raw),
        unit: signal.unit().to_string(),
        label: signal.describe(raw).map(str::to_string),
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::signal::ByteOrder;

    fn message(signals: Vec<Signal>) -> Message {
        Message::new(
            0x100,
            "TestMessage".to_string(),
            8,
            String::new(),
            Vec::new(),
            signals,
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap()
    }

    fn mux_message() -> Message {
        let switch = Signal::builder("M")
            .start_bit(0)
            .bit_size(4)
            .mux_switch()
            .build()
            .unwrap();
        let a = Signal::builder("A")
            .start_bit(8)
            .bit_size(8)
            .mux_value(0)
            .build()
            .unwrap();
        let b = Signal::builder("B")
            .start_bit(8)
            .bit_size(8)
            .mux_value(1)
            .build()
            .unwrap();
        message(vec![switch, a, b])
    }

    #[test]
    fn test_switch_value_selects_signal() {
        let msg = mux_message();

        let data = [0x01, 0x42, 0, 0, 0, 0, 0, 0];
        let decoded = decode_frame(&msg, &data);
        let names: Vec<&str> = decoded.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["M", "B"]);

        let data = [0x00, 0x42, 0, 0, 0, 0, 0, 0];
        let decoded = decode_frame(&msg, &data);
        let names: Vec<&str> = decoded.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["M", "A"]);
    }

    #[test]
    fn test_orphaned_mux_value_never_active() {
        let orphan = Signal::builder("A")
            .start_bit(8)
            .bit_size(8)
            .mux_value(0)
            .build()
            .unwrap();
        let msg = message(vec![orphan]);
        assert!(decode_frame(&msg, &[0u8; 8]).is_empty());
    }

    #[test]
    fn test_extended_range_selects_signal() {
        let switch = Signal::builder("Mode")
            .start_bit(0)
            .bit_size(8)
            .mux_switch()
            .build()
            .unwrap();
        let ranged = Signal::builder("R")
            .start_bit(8)
            .bit_size(8)
            .mux_value(0)
            .mux_range("Mode", 2, 4)
            .build()
            .unwrap();
        let msg = message(vec![switch, ranged]);

        for (mode, expected) in [(1u8, false), (2, true), (4, true), (5, false)] {
            let data = [mode, 0, 0, 0, 0, 0, 0, 0];
            let active = decode_frame(&msg, &data).iter().any(|d| d.name == "R");
            assert_eq!(active, expected, "mode {}", mode);
        }
    }

    #[test]
    fn test_multi_level_mux_chain() {
        // Page selects Mode's meaning; Leaf needs Mode in [1..1] AND Mode
        // itself active via Page in [3..3].
        let page = Signal::builder("Page")
            .start_bit(0)
            .bit_size(4)
            .mux_switch()
            .build()
            .unwrap();
        let mode = Signal::builder("Mode")
            .start_bit(4)
            .bit_size(4)
            .mux_value(0)
            .mux_range("Page", 3, 3)
            .build()
            .unwrap();
        let leaf = Signal::builder("Leaf")
            .start_bit(8)
            .bit_size(8)
            .mux_value(0)
            .mux_range("Mode", 1, 1)
            .build()
            .unwrap();
        let msg = message(vec![page, mode, leaf]);

        // Page=3, Mode=1: whole chain satisfied
        let data = [0x13, 0xAA, 0, 0, 0, 0, 0, 0];
        let names: Vec<String> = decode_frame(&msg, &data)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert!(names.contains(&"Leaf".to_string()));

        // Page=2 breaks the chain even though Mode decodes to 1
        let data = [0x12, 0xAA, 0, 0, 0, 0, 0, 0];
        let names: Vec<String> = decode_frame(&msg, &data)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert!(!names.contains(&"Leaf".to_string()));
    }

    #[test]
    fn test_mux_chain_cycle_is_not_present() {
        // A and B gate each other: resolution must terminate and exclude
        // both.
        let a = Signal::builder("A")
            .start_bit(0)
            .bit_size(4)
            .mux_value(0)
            .mux_range("B", 0, 15)
            .build()
            .unwrap();
        let b = Signal::builder("B")
            .start_bit(4)
            .bit_size(4)
            .mux_value(0)
            .mux_range("A", 0, 15)
            .build()
            .unwrap();
        let msg = message(vec![a, b]);
        assert!(decode_frame(&msg, &[0u8; 8]).is_empty());
    }

    #[test]
    fn test_value_encoding_label_resolved() {
        let gear = Signal::builder("Gear")
            .start_bit(0)
            .bit_size(4)
            .encoding(2, "Reverse")
            .build()
            .unwrap();
        let msg = message(vec![gear]);
        let decoded = decode_frame(&msg, &[0x02, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decoded[0].label.as_deref(), Some("Reverse"));
        assert_eq!(decoded[0].raw, 2);
    }

    #[test]
    fn test_big_endian_signal_in_frame() {
        let pressure = Signal::builder("Pressure")
            .start_bit(7)
            .bit_size(16)
            .byte_order(ByteOrder::BigEndian)
            .factor(0.01)
            .unit("kPa")
            .build()
            .unwrap();
        let msg = message(vec![pressure]);
        let decoded = decode_frame(&msg, &[0x03, 0xE8, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decoded[0].raw, 1000);
        assert!((decoded[0].physical - 10.0).abs() < 1e-9);
    }
}
