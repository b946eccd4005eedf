//! DBC text emitter
//!
//! Sections are written in the canonical Vector order (VERSION, NS_, BS_,
//! BU_, VAL_TABLE_, BO_/SG_, BO_TX_BU_, EV_, CM_, BA_DEF_, BA_DEF_DEF_,
//! BA_, VAL_, SIG_GROUP_, SIG_VALTYPE_, SG_MUL_VAL_) so that any DBC
//! consumer, including this crate's own loader, accepts the output.

use crate::network::{
    AccessType, AttributeObjectType, AttributeValue, AttributeValueType, ByteOrder, EnvVarType,
    EnvironmentVariable, Message, MultiplexerIndicator, Network, Signal, ValueType,
};
use std::fmt::Write;

/// Serialize a network into DBC text.
pub fn network_to_dbc(network: &Network) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "VERSION \"{}\"", escape(network.version()));
    out.push('\n');

    // The NS_ block carries the network's own symbol list so that the
    // output reparses to an equal network.
    out.push_str("NS_ :\n");
    for symbol in network.new_symbols() {
        out.push('\t');
        out.push_str(symbol);
        out.push('\n');
    }
    out.push('\n');

    let timing = network.bit_timing();
    if timing.is_empty() {
        out.push_str("BS_:\n\n");
    } else {
        let _ = writeln!(
            out,
            "BS_: {} : {},{}\n",
            timing.baudrate, timing.btr1, timing.btr2
        );
    }

    out.push_str("BU_:");
    for node in network.nodes() {
        out.push(' ');
        out.push_str(&node.name);
    }
    out.push_str("\n\n");

    for table in network.value_tables() {
        let _ = write!(out, "VAL_TABLE_ {}", table.name);
        for encoding in &table.encodings {
            let _ = write!(
                out,
                " {} \"{}\"",
                format_encoding_value(encoding.value),
                escape(&encoding.description)
            );
        }
        out.push_str(" ;\n");
    }
    if !network.value_tables().is_empty() {
        out.push('\n');
    }

    for message in network.messages() {
        write_message(&mut out, message);
        out.push('\n');
    }

    for message in network.messages() {
        if message.message_transmitters().is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "BO_TX_BU_ {} : {};",
            message.id(),
            message.message_transmitters().join(",")
        );
    }
    out.push('\n');

    for var in network.environment_variables() {
        write_environment_variable(&mut out, var);
    }
    for var in network.environment_variables() {
        // The model keeps no payload size for data variables; the kind
        // itself still round-trips through this line.
        if var.var_type == EnvVarType::Data {
            let _ = writeln!(out, "ENVVAR_DATA_ {}: 0;", var.name);
        }
    }
    if !network.environment_variables().is_empty() {
        out.push('\n');
    }

    write_comments(&mut out, network);
    out.push('\n');

    write_attribute_definitions(&mut out, network);
    write_attribute_defaults(&mut out, network);
    write_attribute_values(&mut out, network);
    out.push('\n');

    write_value_encodings(&mut out, network);
    write_signal_groups(&mut out, network);
    write_sig_valtype(&mut out, network);
    write_extended_multiplex(&mut out, network);

    out
}

fn write_message(out: &mut String, message: &Message) {
    let transmitter = if message.transmitter().is_empty() {
        "Vector__XXX"
    } else {
        message.transmitter()
    };
    let _ = writeln!(
        out,
        "BO_ {} {}: {} {}",
        message.id(),
        message.name(),
        message.size(),
        transmitter
    );
    for signal in message.signals() {
        write_signal(out, signal);
    }
}

fn write_signal(out: &mut String, signal: &Signal) {
    let mux_tag = match signal.multiplexer_indicator() {
        MultiplexerIndicator::None => String::new(),
        MultiplexerIndicator::MuxSwitch => " M".to_string(),
        MultiplexerIndicator::MuxValue => format!(" m{}", signal.multiplexer_switch_value()),
    };
    let endian = match signal.byte_order() {
        ByteOrder::LittleEndian => '1',
        ByteOrder::BigEndian => '0',
    };
    let sign = match signal.value_type() {
        ValueType::Signed => '-',
        _ => '+',
    };
    let receivers = if signal.receivers().is_empty() {
        "Vector__XXX".to_string()
    } else {
        signal.receivers().join(",")
    };
    let _ = writeln!(
        out,
        " SG_ {}{} : {}|{}@{}{} ({},{}) [{}|{}] \"{}\" {}",
        signal.name(),
        mux_tag,
        signal.start_bit(),
        signal.bit_size(),
        endian,
        sign,
        format_f64(signal.factor()),
        format_f64(signal.offset()),
        format_f64(signal.min()),
        format_f64(signal.max()),
        escape(signal.unit()),
        receivers
    );
}

fn write_environment_variable(out: &mut String, var: &EnvironmentVariable) {
    let var_type = match var.var_type {
        EnvVarType::Integer => 0,
        EnvVarType::Float => 1,
        EnvVarType::Data => 0,
    };
    let access = match var.access_type {
        AccessType::Unrestricted => "DUMMY_NODE_VECTOR0",
        AccessType::Read => "DUMMY_NODE_VECTOR1",
        AccessType::Write => "DUMMY_NODE_VECTOR2",
        AccessType::ReadWrite => "DUMMY_NODE_VECTOR3",
    };
    let nodes = if var.access_nodes.is_empty() {
        "Vector__XXX".to_string()
    } else {
        var.access_nodes.join(",")
    };
    let _ = writeln!(
        out,
        "EV_ {}: {} [{}|{}] \"{}\" {} {} {} {};",
        var.name,
        var_type,
        format_f64(var.min),
        format_f64(var.max),
        escape(&var.unit),
        format_f64(var.initial_value),
        var.ev_id,
        access,
        nodes
    );
}

fn write_comments(out: &mut String, network: &Network) {
    if !network.comment().is_empty() {
        let _ = writeln!(out, "CM_ \"{}\";", escape(network.comment()));
    }
    for node in network.nodes() {
        if !node.comment.is_empty() {
            let _ = writeln!(out, "CM_ BU_ {} \"{}\";", node.name, escape(&node.comment));
        }
    }
    for message in network.messages() {
        if !message.comment().is_empty() {
            let _ = writeln!(
                out,
                "CM_ BO_ {} \"{}\";",
                message.id(),
                escape(message.comment())
            );
        }
        for signal in message.signals() {
            if !signal.comment().is_empty() {
                let _ = writeln!(
                    out,
                    "CM_ SG_ {} {} \"{}\";",
                    message.id(),
                    signal.name(),
                    escape(signal.comment())
                );
            }
        }
    }
    for var in network.environment_variables() {
        if !var.comment.is_empty() {
            let _ = writeln!(out, "CM_ EV_ {} \"{}\";", var.name, escape(&var.comment));
        }
    }
}

fn write_attribute_definitions(out: &mut String, network: &Network) {
    for def in network.attribute_definitions() {
        let scope = match def.object_type {
            AttributeObjectType::Network => "",
            AttributeObjectType::Node => "BU_ ",
            AttributeObjectType::Message => "BO_ ",
            AttributeObjectType::Signal => "SG_ ",
            AttributeObjectType::EnvironmentVariable => "EV_ ",
        };
        let _ = writeln!(
            out,
            "BA_DEF_ {}\"{}\" {};",
            scope,
            def.name,
            format_value_type(&def.value_type)
        );
    }
}

fn write_attribute_defaults(out: &mut String, network: &Network) {
    for attr in network.attribute_defaults() {
        let _ = writeln!(
            out,
            "BA_DEF_DEF_ \"{}\" {};",
            attr.name,
            format_value(&attr.value)
        );
    }
}

fn write_attribute_values(out: &mut String, network: &Network) {
    for attr in network.attribute_values() {
        let _ = writeln!(out, "BA_ \"{}\" {};", attr.name, format_value(&attr.value));
    }
    for node in network.nodes() {
        for attr in &node.attributes {
            let _ = writeln!(
                out,
                "BA_ \"{}\" BU_ {} {};",
                attr.name,
                node.name,
                format_value(&attr.value)
            );
        }
    }
    for message in network.messages() {
        for attr in message.attributes() {
            let _ = writeln!(
                out,
                "BA_ \"{}\" BO_ {} {};",
                attr.name,
                message.id(),
                format_value(&attr.value)
            );
        }
        for signal in message.signals() {
            for attr in signal.attributes() {
                let _ = writeln!(
                    out,
                    "BA_ \"{}\" SG_ {} {} {};",
                    attr.name,
                    message.id(),
                    signal.name(),
                    format_value(&attr.value)
                );
            }
        }
    }
    for var in network.environment_variables() {
        for attr in &var.attributes {
            let _ = writeln!(
                out,
                "BA_ \"{}\" EV_ {} {};",
                attr.name,
                var.name,
                format_value(&attr.value)
            );
        }
    }
}

fn write_value_encodings(out: &mut String, network: &Network) {
    for message in network.messages() {
        for signal in message.signals() {
            if signal.encodings().is_empty() {
                continue;
            }
            let _ = write!(out, "VAL_ {} {}", message.id(), signal.name());
            for encoding in signal.encodings() {
                let _ = write!(
                    out,
                    " {} \"{}\"",
                    format_encoding_value(encoding.value),
                    escape(&encoding.description)
                );
            }
            out.push_str(" ;\n");
        }
    }
    for var in network.environment_variables() {
        if var.encodings.is_empty() {
            continue;
        }
        let _ = write!(out, "VAL_ {}", var.name);
        for encoding in &var.encodings {
            let _ = write!(
                out,
                " {} \"{}\"",
                format_encoding_value(encoding.value),
                escape(&encoding.description)
            );
        }
        out.push_str(" ;\n");
    }
}

fn write_signal_groups(out: &mut String, network: &Network) {
    for message in network.messages() {
        for group in message.signal_groups() {
            let _ = writeln!(
                out,
                "SIG_GROUP_ {} {} {} : {};",
                message.id(),
                group.name,
                group.repetitions,
                group.signal_names.join(" ")
            );
        }
    }
}

fn write_sig_valtype(out: &mut String, network: &Network) {
    for message in network.messages() {
        for signal in message.signals() {
            let code = match signal.value_type() {
                ValueType::IeeeFloat32 => 1,
                ValueType::IeeeFloat64 => 2,
                _ => continue,
            };
            let _ = writeln!(
                out,
                "SIG_VALTYPE_ {} {} : {};",
                message.id(),
                signal.name(),
                code
            );
        }
    }
}

fn write_extended_multiplex(out: &mut String, network: &Network) {
    for message in network.messages() {
        for signal in message.signals() {
            for range in signal.multiplexer_ranges() {
                let _ = writeln!(
                    out,
                    "SG_MUL_VAL_ {} {} {} {}-{};",
                    message.id(),
                    signal.name(),
                    range.switch_name,
                    range.from,
                    range.to
                );
            }
        }
    }
}

fn format_value_type(value_type: &AttributeValueType) -> String {
    match value_type {
        AttributeValueType::Int { min, max } => format!("INT {} {}", min, max),
        AttributeValueType::Hex { min, max } => format!("HEX {} {}", min, max),
        AttributeValueType::Float { min, max } => {
            format!("FLOAT {} {}", format_f64(*min), format_f64(*max))
        }
        AttributeValueType::Text => "STRING".to_string(),
        AttributeValueType::Enum(values) => {
            let joined = values
                .iter()
                .map(|v| format!("\"{}\"", escape(v)))
                .collect::<Vec<_>>()
                .join(",");
            format!("ENUM {}", joined)
        }
    }
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Float(v) => format_f64(*v),
        AttributeValue::Text(s) => format!("\"{}\"", escape(s)),
        AttributeValue::EnumIndex(i) => i.to_string(),
    }
}

/// Encoding values are stored as the decode engine's bit patterns; a set
/// high bit means a sign-extended negative key, which must be written in
/// its signed form to survive the grammar's float-valued VAL_ keys.
fn format_encoding_value(value: u64) -> String {
    if value & (1 << 63) != 0 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn format_f64(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        let mut s = format!("{:.12}", value);
        while s.contains('.') && s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.push('0');
        }
        s
    }
}

fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
