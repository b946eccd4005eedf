//! candump line handling
//!
//! Parses lines of the shape `<iface> <hex-id> [<size>] <hex-byte>*` (the
//! classic `candump` output) and formats decoded frames back as
//! `<original line> :: <message>(<signal>: <value> <unit>, ...)`.

use dbc_network::{DecodedSignal, Message};

/// One parsed candump line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandumpFrame {
    /// Interface the frame was seen on (e.g. `vcan0`)
    pub interface: String,
    /// Bus identifier, without any extended-id marker
    pub can_id: u64,
    /// Payload padded with zeros to the classic 8 bytes
    pub data: [u8; 8],
}

/// Parse a candump-style line; `None` when the line has another shape.
///
/// The size column is optional and may come bracketed (`[3]`); payload
/// bytes beyond the classic 8 are rejected.
pub fn parse_line(line: &str) -> Option<CandumpFrame> {
    let mut tokens = line.split_whitespace().peekable();

    let interface = tokens.next()?.to_string();
    let can_id = u64::from_str_radix(tokens.next()?, 16).ok()?;

    let mut size = None;
    if let Some(token) = tokens.peek() {
        if token.starts_with('[') {
            let token = tokens.next()?;
            size = token
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<usize>()
                .ok();
        }
    }

    let mut data = [0u8; 8];
    let mut count = 0usize;
    for token in tokens {
        if count == data.len() {
            return None;
        }
        data[count] = u8::from_str_radix(token, 16).ok()?;
        count += 1;
    }
    if let Some(size) = size {
        if size != count {
            log::debug!(
                "candump line declares {} bytes but carries {}: {}",
                size,
                count,
                line
            );
        }
    }

    Some(CandumpFrame {
        interface,
        can_id,
        data,
    })
}

/// Render a decoded frame behind its original line.
pub fn format_decoded(line: &str, message: &Message, signals: &[DecodedSignal]) -> String {
    let rendered: Vec<String> = signals.iter().map(|s| s.to_string()).collect();
    format!("{} :: {}({})", line, message.name(), rendered.join(", "))
}
