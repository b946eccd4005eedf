//! C header emitter
//!
//! Generates one struct per message plus decode accessors that repeat the
//! decode engine's bit math in portable C: the payload is loaded into a
//! uint64_t with byte 0 in the low byte, big-endian signals load the
//! byte-reversed word and use the translated start position, then shift,
//! mask, and sign-extend exactly as `Signal::decode` does.

use crate::network::{ByteOrder, Message, Network, Signal, ValueType};
use std::fmt::Write;

/// Serialize a network into a self-contained C header.
pub fn network_to_c(network: &Network) -> String {
    let mut out = String::new();

    out.push_str("#include <stdint.h>\n");
    out.push_str("#include <string.h>\n\n");

    out.push_str(concat!(
        "static inline uint64_t dbc_word_le(const uint8_t d[8])\n",
        "{\n",
        "    uint64_t w = 0;\n",
        "    for (int i = 7; i >= 0; i--) w = (w << 8) | d[i];\n",
        "    return w;\n",
        "}\n",
        "static inline uint64_t dbc_word_be(const uint8_t d[8])\n",
        "{\n",
        "    uint64_t w = 0;\n",
        "    for (int i = 0; i < 8; i++) w = (w << 8) | d[i];\n",
        "    return w;\n",
        "}\n\n",
    ));

    for message in network.messages() {
        write_message(&mut out, message);
    }

    out
}

fn write_message(out: &mut String, message: &Message) {
    let msg_ident = sanitize(message.name());

    let _ = writeln!(out, "/* {} (0x{:X}) */", message.name(), message.id());
    let _ = writeln!(
        out,
        "#define {}_FRAME_ID 0x{:X}u",
        msg_ident.to_uppercase(),
        message.id()
    );
    let _ = writeln!(out, "typedef struct {{");
    for signal in message.signals() {
        let _ = writeln!(out, "    double {};", sanitize(signal.name()));
    }
    let _ = writeln!(out, "}} {}_t;\n", msg_ident);

    for signal in message.signals() {
        write_signal_accessor(out, &msg_ident, signal);
    }

    let _ = writeln!(
        out,
        "static inline void {}_decode({}_t* out, const uint8_t d[8])\n{{",
        msg_ident, msg_ident
    );
    for signal in message.signals() {
        let sig_ident = sanitize(signal.name());
        let _ = writeln!(
            out,
            "    out->{} = {}_{}_decode(d);",
            sig_ident, msg_ident, sig_ident
        );
    }
    out.push_str("}\n\n");
}

fn write_signal_accessor(out: &mut String, msg_ident: &str, signal: &Signal) {
    let sig_ident = sanitize(signal.name());
    let load = match signal.byte_order() {
        ByteOrder::LittleEndian => "dbc_word_le(d)",
        ByteOrder::BigEndian => "dbc_word_be(d)",
    };
    let shift = lsb_position(signal);
    let mask = if signal.bit_size() == 64 {
        "0xFFFFFFFFFFFFFFFFull".to_string()
    } else {
        format!("0x{:X}ull", (1u64 << signal.bit_size()) - 1)
    };

    let _ = writeln!(
        out,
        "static inline double {}_{}_decode(const uint8_t d[8])\n{{",
        msg_ident, sig_ident
    );
    let _ = writeln!(out, "    uint64_t raw = ({} >> {}) & {};", load, shift, mask);
    match signal.value_type() {
        ValueType::Unsigned => {
            let _ = writeln!(
                out,
                "    return (double)raw * {:?} + {:?};",
                signal.factor(),
                signal.offset()
            );
        }
        ValueType::Signed => {
            let unused = 64 - signal.bit_size();
            let _ = writeln!(
                out,
                "    int64_t v = (int64_t)(raw << {}) >> {};",
                unused, unused
            );
            let _ = writeln!(
                out,
                "    return (double)v * {:?} + {:?};",
                signal.factor(),
                signal.offset()
            );
        }
        ValueType::IeeeFloat32 => {
            out.push_str("    uint32_t bits = (uint32_t)raw;\n");
            out.push_str("    float v;\n");
            out.push_str("    memcpy(&v, &bits, sizeof v);\n");
            let _ = writeln!(
                out,
                "    return (double)v * {:?} + {:?};",
                signal.factor(),
                signal.offset()
            );
        }
        ValueType::IeeeFloat64 => {
            out.push_str("    double v;\n");
            out.push_str("    memcpy(&v, &raw, sizeof v);\n");
            let _ = writeln!(
                out,
                "    return v * {:?} + {:?};",
                signal.factor(),
                signal.offset()
            );
        }
    }
    out.push_str("}\n\n");
}

/// Same translation the decode engine performs.
fn lsb_position(signal: &Signal) -> u64 {
    match signal.byte_order() {
        ByteOrder::LittleEndian => signal.start_bit(),
        ByteOrder::BigEndian => {
            let msb = 8 * (7 - signal.start_bit() / 8) + signal.start_bit() % 8;
            msb + 1 - signal.bit_size()
        }
    }
}

/// Reduce a DBC identifier to a C identifier in snake case.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                out.push(ch.to_ascii_lowercase());
                prev_lower = false;
            } else {
                out.push(ch);
                prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            }
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    let trimmed = out.trim_matches('_').to_string();
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{}", trimmed)
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::BitTiming;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("EngineSpeed"), "engine_speed");
        assert_eq!(sanitize("ABSActive"), "absactive");
        assert_eq!(sanitize("Cell-Voltage 1"), "cell_voltage_1");
        assert_eq!(sanitize("4WD"), "_4wd");
    }

    #[test]
    fn test_generated_accessor_mirrors_engine() {
        let signal = Signal::builder("Temp")
            .start_bit(8)
            .bit_size(16)
            .value_type(ValueType::Signed)
            .factor(0.1)
            .offset(-40.0)
            .build()
            .unwrap();
        let message = Message::new(
            291,
            "EngineData".to_string(),
            8,
            String::new(),
            Vec::new(),
            vec![signal],
            Vec::new(),
            String::new(),
            Vec::new(),
        )
        .unwrap();
        let network = Network::new(
            String::new(),
            Vec::new(),
            BitTiming::default(),
            Vec::new(),
            Vec::new(),
            vec![message],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
        )
        .unwrap();

        let header = network_to_c(&network);
        assert!(header.contains("#define ENGINE_DATA_FRAME_ID 0x123u"));
        assert!(header.contains("typedef struct {"));
        assert!(header.contains("double temp;"));
        // 16 bits at start 8: shift 8, mask 0xFFFF, signed shift pair 48
        assert!(header.contains("uint64_t raw = (dbc_word_le(d) >> 8) & 0xFFFFull;"));
        assert!(header.contains("int64_t v = (int64_t)(raw << 48) >> 48;"));
    }
}
