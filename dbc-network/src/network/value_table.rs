//! Value encodings and value tables (the DBC `VAL_` / `VAL_TABLE_` sections)

use serde::{Deserialize, Serialize};

/// A single raw-value-to-label pair.
///
/// Raw values are stored as the same 64-bit bit pattern the decode engine
/// produces, so a negative encoding of a signed signal compares equal to the
/// sign-extended decode result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEncoding {
    /// Raw value the label applies to
    pub value: u64,
    /// Human-readable label
    pub description: String,
}

impl ValueEncoding {
    pub fn new(value: u64, description: String) -> Self {
        Self { value, description }
    }
}

/// A named, reusable set of value encodings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    /// Table name (unique within the network)
    pub name: String,
    /// Optional signal type this table describes, referenced by name
    pub signal_type: Option<String>,
    /// Encodings, unique by raw value
    pub encodings: Vec<ValueEncoding>,
}

impl ValueTable {
    pub fn new(name: String, signal_type: Option<String>, encodings: Vec<ValueEncoding>) -> Self {
        Self {
            name,
            signal_type,
            encodings,
        }
    }

    /// Look up the label for a raw value.
    pub fn describe(&self, raw: u64) -> Option<&str> {
        self.encodings
            .iter()
            .find(|e| e.value == raw)
            .map(|e| e.description.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let table = ValueTable::new(
            "Gear".to_string(),
            None,
            vec![
                ValueEncoding::new(0, "Neutral".to_string()),
                ValueEncoding::new(1, "Drive".to_string()),
            ],
        );
        assert_eq!(table.describe(1), Some("Drive"));
        assert_eq!(table.describe(5), None);
    }
}
