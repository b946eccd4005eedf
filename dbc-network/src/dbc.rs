//! DBC file loader
//!
//! The textual DBC grammar is delegated to the `can-dbc` crate; this module
//! owns the conversion of its raw syntax tree into the validated network
//! model. Loading is dispatched by file extension: `.dbc` goes through the
//! grammar parser, anything else yields `Ok(None)` without raising.

use crate::network::{
    AccessType, Attribute, AttributeDefinition, AttributeObjectType, AttributeValue,
    AttributeValueType, BitTiming, ByteOrder, EnvVarType, EnvironmentVariable, Message,
    MultiplexerRange, Network, Node, Signal, SignalGroup, ValueEncoding, ValueTable, ValueType,
};
use crate::types::{NetworkError, Result};
use std::path::Path;

/// Load a network from a database file, dispatching on the extension.
///
/// `.dbc` files go through the DBC grammar parser; any other extension
/// returns `Ok(None)`. IO and parse failures are errors.
pub fn load_network_from_file(path: &Path) -> Result<Option<Network>> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("dbc") => {
            log::info!("Loading DBC file: {:?}", path);
            let bytes = std::fs::read(path).map_err(|e| {
                NetworkError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
            })?;
            let content = decode_text(bytes);
            let network = parse_dbc(&content)?;
            log::info!(
                "DBC file loaded: {} messages, {} nodes",
                network.messages().len(),
                network.nodes().len()
            );
            Ok(Some(network))
        }
        _ => {
            log::warn!("No loader for file extension of {:?}, no network loaded", path);
            Ok(None)
        }
    }
}

/// Decode file bytes as UTF-8, falling back to Latin-1 for the many DBC
/// files exported with legacy Windows encodings.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("DBC file is not UTF-8, falling back to Latin-1");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

/// Parse DBC text into a network.
pub fn parse_dbc(content: &str) -> Result<Network> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes())
        .map_err(|e| NetworkError::DbcParseError(format!("{:?}", e)))?;

    let definitions = convert_attribute_definitions(&dbc);

    let bit_timing = convert_bit_timing(&dbc);
    let nodes = convert_nodes(&dbc, &definitions)?;
    let value_tables = convert_value_tables(&dbc);
    let messages = convert_messages(&dbc, &definitions)?;
    let environment_variables = convert_environment_variables(&dbc, &definitions)?;
    let (attribute_defaults, attribute_values) = convert_network_attributes(&dbc, &definitions)?;

    let comment = dbc
        .comments()
        .iter()
        .find_map(|c| match c {
            can_dbc::Comment::Plain { comment } => Some(comment.clone()),
            _ => None,
        })
        .unwrap_or_default();

    Network::new(
        dbc.version().0.clone(),
        dbc.new_symbols().iter().map(|s| s.0.clone()).collect(),
        bit_timing,
        nodes,
        value_tables,
        messages,
        environment_variables,
        definitions,
        attribute_defaults,
        attribute_values,
        comment,
    )
}

fn convert_bit_timing(dbc: &can_dbc::DBC) -> BitTiming {
    // The grammar crate exposes the BS_ section as a bare baudrate list;
    // the first three entries map onto baudrate/BTR1/BTR2.
    let mut timing = BitTiming::default();
    if let Some(baudrates) = dbc.bit_timing() {
        let mut values = baudrates.iter().map(baudrate_value);
        timing.baudrate = values.next().unwrap_or(0);
        timing.btr1 = values.next().unwrap_or(0);
        timing.btr2 = values.next().unwrap_or(0);
    }
    timing
}

// `can_dbc::Baudrate` keeps its inner `u64` private and exposes no accessor
// in this version of the crate, so the value is recovered from its `Debug`
// output (`Baudrate(<value>)`) instead of a field access.
fn baudrate_value(b: &can_dbc::Baudrate) -> u64 {
    let repr = format!("{:?}", b);
    repr.trim_start_matches("Baudrate(")
        .trim_end_matches(')')
        .parse()
        .unwrap_or(0)
}

fn convert_nodes(dbc: &can_dbc::DBC, definitions: &[AttributeDefinition]) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for node_list in dbc.nodes() {
        for name in &node_list.0 {
            let comment = dbc
                .comments()
                .iter()
                .find_map(|c| match c {
                    can_dbc::Comment::Node { node_name, comment } if node_name == name => {
                        Some(comment.clone())
                    }
                    _ => None,
                })
                .unwrap_or_default();

            let mut attributes = Vec::new();
            for av in dbc.attribute_values() {
                if let can_dbc::AttributeValuedForObjectType::NetworkNodeAttributeValue(
                    node_name,
                    value,
                ) = av.attribute_value()
                {
                    if node_name == name {
                        if let Some(attr) = instantiate_attribute(
                            definitions,
                            AttributeObjectType::Node,
                            av.attribute_name(),
                            value,
                        )? {
                            attributes.push(attr);
                        }
                    }
                }
            }

            nodes.push(Node::new(name.clone(), comment, attributes)?);
        }
    }
    Ok(nodes)
}

fn convert_value_tables(dbc: &can_dbc::DBC) -> Vec<ValueTable> {
    dbc.value_tables()
        .iter()
        .map(|vt| {
            ValueTable::new(
                vt.value_table_name().clone(),
                None,
                vt.value_descriptions()
                    .iter()
                    .map(convert_val_description)
                    .collect(),
            )
        })
        .collect()
}

/// DBC stores VAL_ keys as floats; they are raw bit patterns, so negative
/// keys become the sign-extended pattern the decode engine produces.
fn convert_val_description(vd: &can_dbc::ValDescription) -> ValueEncoding {
    ValueEncoding::new(*vd.a() as i64 as u64, vd.b().clone())
}

fn convert_messages(
    dbc: &can_dbc::DBC,
    definitions: &[AttributeDefinition],
) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    for dbc_msg in dbc.messages() {
        messages.push(convert_message(dbc, dbc_msg, definitions)?);
    }
    Ok(messages)
}

fn convert_message(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    definitions: &[AttributeDefinition],
) -> Result<Message> {
    let id = dbc_msg.message_id().0 as u64;

    let transmitter = match dbc_msg.transmitter() {
        can_dbc::Transmitter::NodeName(name) => name.clone(),
        _ => String::new(),
    };

    // BO_TX_BU_ entries for this id
    let mut message_transmitters = Vec::new();
    for mt in dbc.message_transmitters() {
        if mt.message_id().0 == dbc_msg.message_id().0 {
            for tx in mt.transmitter() {
                if let can_dbc::Transmitter::NodeName(name) = tx {
                    if !message_transmitters.contains(name) {
                        message_transmitters.push(name.clone());
                    }
                }
            }
        }
    }

    let mut signals = Vec::new();
    for dbc_sig in dbc_msg.signals() {
        signals.push(convert_signal(dbc, dbc_msg, dbc_sig, definitions)?);
    }

    let mut attributes = Vec::new();
    for av in dbc.attribute_values() {
        if let can_dbc::AttributeValuedForObjectType::MessageDefinitionAttributeValue(
            message_id,
            Some(value),
        ) = av.attribute_value()
        {
            if message_id.0 == dbc_msg.message_id().0 {
                if let Some(attr) = instantiate_attribute(
                    definitions,
                    AttributeObjectType::Message,
                    av.attribute_name(),
                    value,
                )? {
                    attributes.push(attr);
                }
            }
        }
    }

    let comment = dbc
        .comments()
        .iter()
        .find_map(|c| match c {
            can_dbc::Comment::Message {
                message_id,
                comment,
            } if message_id.0 == dbc_msg.message_id().0 => Some(comment.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let signal_groups = dbc
        .signal_groups()
        .iter()
        .filter(|sg| sg.message_id().0 == dbc_msg.message_id().0)
        .map(|sg| {
            SignalGroup::new(
                id,
                sg.signal_group_name().clone(),
                *sg.repetitions(),
                sg.signal_names().clone(),
            )
        })
        .collect();

    Message::new(
        id,
        dbc_msg.message_name().clone(),
        *dbc_msg.message_size(),
        transmitter,
        message_transmitters,
        signals,
        attributes,
        comment,
        signal_groups,
    )
}

fn convert_signal(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    dbc_sig: &can_dbc::Signal,
    definitions: &[AttributeDefinition],
) -> Result<Signal> {
    let mut builder = Signal::builder(dbc_sig.name())
        .start_bit(*dbc_sig.start_bit())
        .bit_size(*dbc_sig.signal_size())
        .byte_order(match dbc_sig.byte_order() {
            can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
            can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
        })
        .value_type(convert_value_type(dbc, dbc_msg, dbc_sig))
        .factor(*dbc_sig.factor())
        .offset(*dbc_sig.offset())
        .range(*dbc_sig.min(), *dbc_sig.max())
        .unit(dbc_sig.unit())
        .receivers(
            dbc_sig
                .receivers()
                .iter()
                .filter(|r| r.as_str() != "Vector__XXX")
                .cloned()
                .collect(),
        );

    builder = match dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::Plain => builder,
        can_dbc::MultiplexIndicator::Multiplexor => builder.mux_switch(),
        can_dbc::MultiplexIndicator::MultiplexedSignal(value) => builder.mux_value(*value),
        can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(_) => {
            // The model has no combined role; keep the switch side
            log::warn!(
                "signal '{}' declares both multiplexer roles, keeping the switch role",
                dbc_sig.name()
            );
            builder.mux_switch()
        }
    };

    // VAL_ encodings for this signal
    let encodings: Vec<ValueEncoding> = dbc
        .value_descriptions()
        .iter()
        .filter_map(|vd| match vd {
            can_dbc::ValueDescription::Signal {
                message_id,
                signal_name,
                value_descriptions,
            } if message_id.0 == dbc_msg.message_id().0 && signal_name == dbc_sig.name() => {
                Some(value_descriptions.iter().map(convert_val_description))
            }
            _ => None,
        })
        .flatten()
        .collect();
    builder = builder.encodings(encodings);

    // SG_MUL_VAL_ extended multiplex ranges, flattened to one entry per
    // interval
    let ranges: Vec<MultiplexerRange> = dbc
        .extended_multiplex()
        .iter()
        .filter(|em| {
            em.message_id().0 == dbc_msg.message_id().0 && em.signal_name() == dbc_sig.name()
        })
        .flat_map(|em| {
            em.mappings().iter().map(|m| {
                MultiplexerRange::new(
                    em.multiplexor_signal_name().clone(),
                    *m.min_value(),
                    *m.max_value(),
                )
            })
        })
        .collect();
    builder = builder.mux_ranges(ranges);

    let comment = dbc
        .comments()
        .iter()
        .find_map(|c| match c {
            can_dbc::Comment::Signal {
                message_id,
                signal_name,
                comment,
            } if message_id.0 == dbc_msg.message_id().0 && signal_name == dbc_sig.name() => {
                Some(comment.as_str())
            }
            _ => None,
        })
        .unwrap_or_default();
    builder = builder.comment(comment);

    let mut attributes = Vec::new();
    for av in dbc.attribute_values() {
        if let can_dbc::AttributeValuedForObjectType::SignalAttributeValue(
            message_id,
            signal_name,
            value,
        ) = av.attribute_value()
        {
            if message_id.0 == dbc_msg.message_id().0 && signal_name == dbc_sig.name() {
                if let Some(attr) = instantiate_attribute(
                    definitions,
                    AttributeObjectType::Signal,
                    av.attribute_name(),
                    value,
                )? {
                    attributes.push(attr);
                }
            }
        }
    }
    builder = builder.attributes(attributes);

    builder.build()
}

/// The SG_ sign flag gives signed/unsigned; a SIG_VALTYPE_ entry upgrades
/// the signal to an IEEE float pattern.
fn convert_value_type(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    dbc_sig: &can_dbc::Signal,
) -> ValueType {
    let base = match dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };
    for ev in dbc.signal_extended_value_type_list() {
        if ev.message_id().0 == dbc_msg.message_id().0 && ev.signal_name() == dbc_sig.name() {
            return match ev.signal_extended_value_type() {
                can_dbc::SignalExtendedValueType::SignedOrUnsignedInteger => base,
                can_dbc::SignalExtendedValueType::IEEEfloat32Bit => ValueType::IeeeFloat32,
                can_dbc::SignalExtendedValueType::IEEEdouble64bit => ValueType::IeeeFloat64,
            };
        }
    }
    base
}

fn convert_environment_variables(
    dbc: &can_dbc::DBC,
    definitions: &[AttributeDefinition],
) -> Result<Vec<EnvironmentVariable>> {
    let mut variables = Vec::new();
    for ev in dbc.environment_variables() {
        let name = ev.env_var_name().clone();

        let var_type = if dbc
            .environment_variable_data()
            .iter()
            .any(|d| d.env_var_name() == &name)
        {
            EnvVarType::Data
        } else {
            match ev.env_var_type() {
                can_dbc::EnvType::EnvTypeFloat => EnvVarType::Float,
                can_dbc::EnvType::EnvTypeu64 => EnvVarType::Integer,
                can_dbc::EnvType::EnvTypeData => EnvVarType::Data,
            }
        };

        let access_type = match ev.access_type() {
            can_dbc::AccessType::DummyNodeVector0 => AccessType::Unrestricted,
            can_dbc::AccessType::DummyNodeVector1 => AccessType::Read,
            can_dbc::AccessType::DummyNodeVector2 => AccessType::Write,
            can_dbc::AccessType::DummyNodeVector3 => AccessType::ReadWrite,
        };

        let access_nodes = ev
            .access_nodes()
            .iter()
            .filter_map(|n| match n {
                can_dbc::AccessNode::AccessNodeName(name) => Some(name.clone()),
                can_dbc::AccessNode::AccessNodeVectorXXX => None,
            })
            .collect();

        let encodings = dbc
            .value_descriptions()
            .iter()
            .filter_map(|vd| match vd {
                can_dbc::ValueDescription::EnvironmentVariable {
                    env_var_name,
                    value_descriptions,
                } if env_var_name == &name => {
                    Some(value_descriptions.iter().map(convert_val_description))
                }
                _ => None,
            })
            .flatten()
            .collect();

        let comment = dbc
            .comments()
            .iter()
            .find_map(|c| match c {
                can_dbc::Comment::EnvVar {
                    env_var_name,
                    comment,
                } if env_var_name == &name => Some(comment.clone()),
                _ => None,
            })
            .unwrap_or_default();

        let mut attributes = Vec::new();
        for av in dbc.attribute_values() {
            if let can_dbc::AttributeValuedForObjectType::EnvVariableAttributeValue(
                env_var_name,
                value,
            ) = av.attribute_value()
            {
                if env_var_name == &name {
                    if let Some(attr) = instantiate_attribute(
                        definitions,
                        AttributeObjectType::EnvironmentVariable,
                        av.attribute_name(),
                        value,
                    )? {
                        attributes.push(attr);
                    }
                }
            }
        }

        variables.push(
            EnvironmentVariable {
                name,
                var_type,
                min: *ev.min() as f64,
                max: *ev.max() as f64,
                unit: ev.unit().clone(),
                initial_value: *ev.initial_value(),
                ev_id: *ev.ev_id() as u64,
                access_type,
                access_nodes,
                encodings,
                comment,
                attributes,
            }
            .validate()?,
        );
    }
    Ok(variables)
}

/// Parse the raw `BA_DEF_` bodies the grammar crate leaves unstructured,
/// e.g. `"GenMsgCycleTime" INT 0 65535`.
fn convert_attribute_definitions(dbc: &can_dbc::DBC) -> Vec<AttributeDefinition> {
    let mut definitions = Vec::new();
    for def in dbc.attribute_definitions() {
        let (object_type, body) = match def {
            can_dbc::AttributeDefinition::Node(body) => (AttributeObjectType::Node, body),
            can_dbc::AttributeDefinition::Message(body) => (AttributeObjectType::Message, body),
            can_dbc::AttributeDefinition::Signal(body) => (AttributeObjectType::Signal, body),
            can_dbc::AttributeDefinition::EnvironmentVariable(body) => {
                (AttributeObjectType::EnvironmentVariable, body)
            }
            can_dbc::AttributeDefinition::Plain(body) => (AttributeObjectType::Network, body),
        };
        match parse_definition_body(body) {
            Some((name, value_type)) => {
                definitions.push(AttributeDefinition::new(name, object_type, value_type));
            }
            None => log::warn!("unparseable attribute definition: {}", body),
        }
    }
    definitions
}

/// Split a `BA_DEF_` body into the quoted attribute name and the value
/// schema.
fn parse_definition_body(body: &str) -> Option<(String, AttributeValueType)> {
    let body = body.trim().trim_end_matches(';').trim();
    let rest = body.strip_prefix('"')?;
    let (name, rest) = rest.split_once('"')?;
    let mut tokens = rest.split_whitespace();
    let value_type = match tokens.next()? {
        "INT" => AttributeValueType::Int {
            min: tokens.next()?.parse().ok()?,
            max: tokens.next()?.parse().ok()?,
        },
        "HEX" => AttributeValueType::Hex {
            min: tokens.next()?.parse().ok()?,
            max: tokens.next()?.parse().ok()?,
        },
        "FLOAT" => AttributeValueType::Float {
            min: tokens.next()?.parse().ok()?,
            max: tokens.next()?.parse().ok()?,
        },
        "STRING" => AttributeValueType::Text,
        "ENUM" => {
            let list = rest.trim_start().strip_prefix("ENUM")?.trim();
            let values = list
                .split(',')
                .map(|v| v.trim().trim_matches('"').to_string())
                .filter(|v| !v.is_empty())
                .collect();
            AttributeValueType::Enum(values)
        }
        _ => return None,
    };
    Some((name.to_string(), value_type))
}

/// Build a validated attribute for a host of the given object type; `None`
/// (with a warning) when no matching definition exists.
fn instantiate_attribute(
    definitions: &[AttributeDefinition],
    object_type: AttributeObjectType,
    name: &str,
    value: &can_dbc::AttributeValue,
) -> Result<Option<Attribute>> {
    let Some(definition) = definitions
        .iter()
        .find(|d| d.object_type == object_type && d.name == name)
    else {
        log::warn!(
            "attribute '{}' has no {:?}-scoped definition, dropping it",
            name,
            object_type
        );
        return Ok(None);
    };
    let value = convert_attribute_value(definition, value)?;
    definition.instantiate(value).map(Some)
}

/// Map the grammar crate's value onto the definition's schema.
fn convert_attribute_value(
    definition: &AttributeDefinition,
    value: &can_dbc::AttributeValue,
) -> Result<AttributeValue> {
    let converted = match value {
        can_dbc::AttributeValue::AttributeValueU64(v) => match definition.value_type {
            AttributeValueType::Enum(_) => AttributeValue::EnumIndex(*v as usize),
            AttributeValueType::Float { .. } => AttributeValue::Float(*v as f64),
            _ => AttributeValue::Int(*v as i64),
        },
        can_dbc::AttributeValue::AttributeValueI64(v) => match definition.value_type {
            AttributeValueType::Enum(_) => AttributeValue::EnumIndex(*v as usize),
            AttributeValueType::Float { .. } => AttributeValue::Float(*v as f64),
            _ => AttributeValue::Int(*v),
        },
        can_dbc::AttributeValue::AttributeValueF64(v) => match definition.value_type {
            // DBC writers emit integral numbers without a decimal point
            AttributeValueType::Int { .. } | AttributeValueType::Hex { .. } => {
                AttributeValue::Int(*v as i64)
            }
            AttributeValueType::Enum(_) => AttributeValue::EnumIndex(*v as usize),
            _ => AttributeValue::Float(*v),
        },
        can_dbc::AttributeValue::AttributeValueCharString(s) => {
            match definition.enum_index_of(s) {
                Some(index) => index,
                None => AttributeValue::Text(s.clone()),
            }
        }
    };
    Ok(converted)
}

/// BA_DEF_DEF_ defaults and network-level BA_ values; both are hosted by
/// the network, so they carry the network scope while the value is checked
/// against the owning definition's schema.
fn convert_network_attributes(
    dbc: &can_dbc::DBC,
    definitions: &[AttributeDefinition],
) -> Result<(Vec<Attribute>, Vec<Attribute>)> {
    let mut defaults = Vec::new();
    for default in dbc.attribute_defaults() {
        let Some(definition) = definitions
            .iter()
            .find(|d| d.name == default.attribute_name().as_str())
        else {
            log::warn!(
                "attribute default '{}' has no definition, dropping it",
                default.attribute_name()
            );
            continue;
        };
        let value = convert_attribute_value(definition, default.attribute_value())?;
        definition.check(&value)?;
        defaults.push(Attribute {
            name: definition.name.clone(),
            object_type: AttributeObjectType::Network,
            value,
        });
    }

    let mut values = Vec::new();
    for av in dbc.attribute_values() {
        if let can_dbc::AttributeValuedForObjectType::RawAttributeValue(value) =
            av.attribute_value()
        {
            if let Some(attr) = instantiate_attribute(
                definitions,
                AttributeObjectType::Network,
                av.attribute_name(),
                value,
            )? {
                values.push(attr);
            }
        }
    }

    Ok((defaults, values))
}
