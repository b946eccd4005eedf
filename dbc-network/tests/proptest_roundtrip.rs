//! Property-based tests for the decode engine and the merge operation.

use dbc_network::{BitTiming, ByteOrder, Message, Network, Signal, ValueType};
use proptest::prelude::*;

/// Generate a valid little-endian or big-endian signal layout.
fn gen_layout() -> impl Strategy<Value = (ByteOrder, u64, u64)> {
    (any::<bool>(), 1u64..=64u64).prop_flat_map(|(big_endian, bit_size)| {
        if big_endian {
            // Motorola: pick a start bit whose linear MSB leaves room for
            // the field
            let min_msb = bit_size - 1;
            (min_msb..=63u64)
                .prop_map(move |msb| {
                    let start_bit = 8 * (7 - msb / 8) + msb % 8;
                    (ByteOrder::BigEndian, start_bit, bit_size)
                })
                .boxed()
        } else {
            (0u64..=64 - bit_size)
                .prop_map(move |start_bit| (ByteOrder::LittleEndian, start_bit, bit_size))
                .boxed()
        }
    })
}

fn build_signal(byte_order: ByteOrder, start_bit: u64, bit_size: u64, signed: bool) -> Signal {
    Signal::builder("S")
        .start_bit(start_bit)
        .bit_size(bit_size)
        .byte_order(byte_order)
        .value_type(if signed {
            ValueType::Signed
        } else {
            ValueType::Unsigned
        })
        .build()
        .expect("generated layout must be valid")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Encoding raw bits into a zero payload and decoding them back is the
    /// identity on the low `bit_size` bits (sign-extended when signed).
    #[test]
    fn test_encode_decode_round_trip(
        (byte_order, start_bit, bit_size) in gen_layout(),
        raw in any::<u64>(),
        signed in any::<bool>(),
    ) {
        let signal = build_signal(byte_order, start_bit, bit_size, signed);
        let mut payload = [0u8; 8];
        signal.encode(raw, &mut payload);
        let decoded = signal.decode(&payload);

        let mask = if bit_size == 64 { u64::MAX } else { (1u64 << bit_size) - 1 };
        let mut expected = raw & mask;
        if signed && bit_size < 64 && expected & (1 << (bit_size - 1)) != 0 {
            expected |= !mask;
        }
        prop_assert_eq!(decoded, expected);
    }

    /// Encoding must not disturb payload bits outside the field.
    #[test]
    fn test_encode_preserves_other_bits(
        (byte_order, start_bit, bit_size) in gen_layout(),
        raw in any::<u64>(),
        background in any::<[u8; 8]>(),
    ) {
        let signal = build_signal(byte_order, start_bit, bit_size, false);

        let mut painted = background;
        signal.encode(raw, &mut painted);

        // Re-encoding the original field contents over the painted payload
        // must restore the background exactly.
        let original_field = signal.decode(&background);
        signal.encode(original_field, &mut painted);
        prop_assert_eq!(painted, background);
    }

    /// phys_to_raw inverts raw_to_phys for identity scaling, and within
    /// rounding for arbitrary factors.
    #[test]
    fn test_phys_round_trip(
        (byte_order, start_bit, bit_size) in gen_layout(),
        raw in any::<u64>(),
        signed in any::<bool>(),
    ) {
        let signal = build_signal(byte_order, start_bit, bit_size, signed);
        let mut payload = [0u8; 8];
        signal.encode(raw, &mut payload);
        let decoded = signal.decode(&payload);

        // factor 1 / offset 0: the double round-trip is exact up to 53 bits
        if bit_size <= 53 {
            prop_assert_eq!(signal.phys_to_raw(signal.raw_to_phys(decoded)), decoded);
        }
    }

    /// Merging a network with its own clone is the identity.
    #[test]
    fn test_merge_idempotent(
        ids in prop::collection::btree_set(1u64..1000, 0..6),
        factor in 0.001f64..1000.0,
    ) {
        let messages: Vec<Message> = ids
            .iter()
            .map(|&id| {
                let signal = Signal::builder(&format!("Sig{}", id))
                    .start_bit(0)
                    .bit_size(16)
                    .factor(factor)
                    .build()
                    .unwrap();
                Message::new(
                    id,
                    format!("Msg{}", id),
                    8,
                    "ECU1".to_string(),
                    Vec::new(),
                    vec![signal],
                    Vec::new(),
                    String::new(),
                    Vec::new(),
                )
                .unwrap()
            })
            .collect();
        let mut network = Network::new(
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
        .unwrap();

        let copy = network.clone();
        network.merge(copy.clone());
        prop_assert_eq!(network, copy);
    }
}
