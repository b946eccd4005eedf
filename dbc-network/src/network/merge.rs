//! Merging two networks describing overlapping buses
//!
//! The merge is a name-keyed set union with entity-specific recursion:
//! messages merge by id, signals within a colliding message merge by name,
//! and the leaf collections either union (symbol and transmitter lists) or
//! let the incoming entry replace the resident one wholesale. `other` is
//! consumed by value, so a partially cannibalized network can never be
//! reused by accident.

use crate::network::message::Message;
use crate::network::signal::Signal;
use crate::network::Network;

/// Overwrite `dst` only when the values differ.
fn compare_set<T: PartialEq>(dst: &mut T, src: T) {
    if *dst != src {
        *dst = src;
    }
}

/// Union preserving first-seen order, deduplicated by equality.
fn unique_merge<T: PartialEq>(dst: &mut Vec<T>, src: Vec<T>) {
    for item in src {
        if !dst.contains(&item) {
            dst.push(item);
        }
    }
}

/// Keyed replace-or-append: on a key collision the incoming entry wins
/// wholesale, otherwise it is appended.
fn merge_keyed<T, K, F>(dst: &mut Vec<T>, src: Vec<T>, key: F)
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    for item in src {
        match dst.iter_mut().find(|existing| key(existing) == key(&item)) {
            Some(slot) => *slot = item,
            None => dst.push(item),
        }
    }
}

impl Network {
    /// Merge `other` into `self`, consuming it.
    ///
    /// Deterministic: iteration order of `other` decides tie-breaking order
    /// of replacements, the final contents depend only on the two inputs.
    /// `version`, `comment`, and the bit timing of `self` are kept.
    pub fn merge(&mut self, other: Network) {
        log::debug!(
            "merging network with {} messages into one with {}",
            other.messages.len(),
            self.messages.len()
        );

        unique_merge(&mut self.new_symbols, other.new_symbols);
        merge_keyed(&mut self.nodes, other.nodes, |n| n.name.clone());
        merge_keyed(&mut self.value_tables, other.value_tables, |t| {
            t.name.clone()
        });

        for message in other.messages {
            match self.messages.iter_mut().find(|m| m.id == message.id) {
                Some(existing) => existing.merge(message),
                None => self.messages.push(message),
            }
        }

        merge_keyed(
            &mut self.environment_variables,
            other.environment_variables,
            |v| v.name.clone(),
        );
        merge_keyed(
            &mut self.attribute_definitions,
            other.attribute_definitions,
            |d| d.name.clone(),
        );
        merge_keyed(&mut self.attribute_defaults, other.attribute_defaults, |a| {
            a.name.clone()
        });
        merge_keyed(&mut self.attribute_values, other.attribute_values, |a| {
            a.name.clone()
        });
    }
}

impl Message {
    /// Merge another message into this one.
    ///
    /// A silent no-op when the ids differ; the caller keys collisions. The
    /// mux-switch index and the error bitset are recomputed from scratch
    /// afterwards.
    pub fn merge(&mut self, other: Message) {
        if self.id != other.id {
            return;
        }
        compare_set(&mut self.name, other.name);
        compare_set(&mut self.size, other.size);
        compare_set(&mut self.transmitter, other.transmitter);
        unique_merge(&mut self.message_transmitters, other.message_transmitters);

        for signal in other.signals {
            match self.signals.iter_mut().find(|s| s.name == signal.name) {
                Some(existing) => existing.merge(signal),
                None => self.signals.push(signal),
            }
        }

        merge_keyed(&mut self.attributes, other.attributes, |a| a.name.clone());
        merge_keyed(&mut self.signal_groups, other.signal_groups, |g| {
            g.name.clone()
        });
        compare_set(&mut self.comment, other.comment);

        self.refresh_derived();
    }
}

impl Signal {
    /// Merge another signal into this one (same name, colliding message).
    pub fn merge(&mut self, other: Signal) {
        compare_set(&mut self.multiplexer_indicator, other.multiplexer_indicator);
        compare_set(
            &mut self.multiplexer_switch_value,
            other.multiplexer_switch_value,
        );
        compare_set(&mut self.start_bit, other.start_bit);
        compare_set(&mut self.bit_size, other.bit_size);
        compare_set(&mut self.byte_order, other.byte_order);
        compare_set(&mut self.value_type, other.value_type);
        compare_set(&mut self.factor, other.factor);
        compare_set(&mut self.offset, other.offset);
        compare_set(&mut self.min, other.min);
        compare_set(&mut self.max, other.max);
        compare_set(&mut self.unit, other.unit);
        compare_set(&mut self.comment, other.comment);

        unique_merge(&mut self.receivers, other.receivers);
        merge_keyed(&mut self.encodings, other.encodings, |e| e.value);
        merge_keyed(&mut self.multiplexer_ranges, other.multiplexer_ranges, |r| {
            (r.switch_name.clone(), r.from, r.to)
        });
        merge_keyed(&mut self.attributes, other.attributes, |a| a.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::bit_timing::BitTiming;
    use crate::network::message::MessageErrorCode;
    use crate::network::node::Node;
    use crate::network::value_table::{ValueEncoding, ValueTable};

    fn message(id: u64, name: &str, signals: Vec<Signal>) -> Message {
        Message::new(
            id,
            name.to_string(),
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

    fn network(messages: Vec<Message>) -> Network {
        Network::new(
            "1.0".to_string(),
            Vec::new(),
            BitTiming::default(),
            Vec::new(),
            Vec::new(),
            messages,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
        )
        .unwrap()
    }

    fn signal_with_factor(name: &str, start: u64, factor: f64) -> Signal {
        Signal::builder(name)
            .start_bit(start)
            .bit_size(8)
            .factor(factor)
            .build()
            .unwrap()
    }

    #[test]
    fn test_overlapping_messages_merge_signals() {
        let mut n1 = network(vec![message(
            100,
            "M",
            vec![
                signal_with_factor("X", 0, 1.0),
                signal_with_factor("Y", 8, 1.0),
            ],
        )]);
        let n2 = network(vec![message(
            100,
            "M",
            vec![
                signal_with_factor("X", 0, 2.0),
                signal_with_factor("Z", 16, 1.0),
            ],
        )]);

        n1.merge(n2);

        assert_eq!(n1.messages().len(), 1);
        let merged = n1.message_by_id(100).unwrap();
        assert_eq!(merged.signals().len(), 3);
        assert_eq!(merged.signal("X").unwrap().factor(), 2.0);
        assert!(merged.signal("Y").is_some());
        assert!(merged.signal("Z").is_some());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut encoded = Signal::builder("Gear")
            .start_bit(0)
            .bit_size(4)
            .encoding(0, "Neutral")
            .encoding(1, "Drive")
            .build()
            .unwrap();
        encoded.receivers.push("ECU2".to_string());
        let mut net = network(vec![message(7, "Gearbox", vec![encoded])]);
        net.nodes
            .push(Node::new("ECU2".to_string(), String::new(), Vec::new()).unwrap());
        net.value_tables.push(ValueTable::new(
            "Gears".to_string(),
            None,
            vec![ValueEncoding::new(0, "Neutral".to_string())],
        ));

        let copy = net.clone();
        net.merge(copy.clone());
        assert_eq!(net, copy);
    }

    #[test]
    fn test_merge_refuses_mismatched_ids() {
        let mut a = message(100, "A", Vec::new());
        let b = message(200, "B", vec![signal_with_factor("X", 0, 1.0)]);
        a.merge(b);
        assert_eq!(a.name(), "A");
        assert!(a.signals().is_empty());
    }

    #[test]
    fn test_merge_recomputes_error_bitset() {
        // n1's message 5 has an orphaned multiplexed signal
        let orphan = Signal::builder("A")
            .start_bit(8)
            .bit_size(8)
            .mux_value(1)
            .build()
            .unwrap();
        let mut n1 = network(vec![message(5, "M", vec![orphan])]);
        assert!(n1.messages()[0].error(MessageErrorCode::MuxValueWithoutMuxSignal));

        // n2 supplies the missing switch; the flag must clear
        let switch = Signal::builder("Mode")
            .start_bit(0)
            .bit_size(4)
            .mux_switch()
            .build()
            .unwrap();
        let n2 = network(vec![message(5, "M", vec![switch])]);
        n1.merge(n2);

        let merged = n1.message_by_id(5).unwrap();
        assert!(merged.error(MessageErrorCode::NoError));
        assert_eq!(merged.mux_signal().unwrap().name(), "Mode");
    }

    #[test]
    fn test_disjoint_merge_is_associative() {
        let a = network(vec![message(1, "A", vec![signal_with_factor("S1", 0, 1.0)])]);
        let b = network(vec![message(2, "B", vec![signal_with_factor("S2", 0, 1.0)])]);
        let c = network(vec![message(3, "C", vec![signal_with_factor("S3", 0, 1.0)])]);

        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        let mut right_inner = b;
        right_inner.merge(c);
        let mut right = a;
        right.merge(right_inner);

        assert_eq!(left, right);
    }

    #[test]
    fn test_new_symbols_union_keeps_first_seen_order() {
        let mut a = network(Vec::new());
        a.new_symbols = vec!["NS_DESC_".to_string(), "CM_".to_string()];
        let mut b = network(Vec::new());
        b.new_symbols = vec!["CM_".to_string(), "BA_".to_string()];
        a.merge(b);
        assert_eq!(a.new_symbols(), ["NS_DESC_", "CM_", "BA_"]);
    }

    #[test]
    fn test_node_collision_replaced_wholesale() {
        let mut a = network(Vec::new());
        a.nodes
            .push(Node::new("ECU1".to_string(), "old".to_string(), Vec::new()).unwrap());
        let mut b = network(Vec::new());
        b.nodes
            .push(Node::new("ECU1".to_string(), "new".to_string(), Vec::new()).unwrap());
        a.merge(b);
        assert_eq!(a.nodes().len(), 1);
        assert_eq!(a.nodes()[0].comment, "new");
    }

    #[test]
    fn test_value_encodings_other_wins() {
        let s1 = Signal::builder("G")
            .bit_size(4)
            .encoding(1, "old")
            .build()
            .unwrap();
        let s2 = Signal::builder("G")
            .bit_size(4)
            .encoding(1, "new")
            .encoding(2, "extra")
            .build()
            .unwrap();
        let mut m1 = message(9, "M", vec![s1]);
        m1.merge(message(9, "M", vec![s2]));
        let merged = m1.signal("G").unwrap();
        assert_eq!(merged.describe(1), Some("new"));
        assert_eq!(merged.describe(2), Some("extra"));
    }
}
