//! Bit-level signal extraction and insertion
//!
//! The payload is handled as one 64-bit word loaded through `byteorder`, so
//! the same shift/mask pair serves both byte orders: a little-endian load
//! puts payload byte 0 into the low byte of the word, a big-endian load is
//! the bytewise reversal Motorola extraction is defined over. Every
//! operation is branch-bounded and allocation free.

use crate::network::signal::{ByteOrder, Signal, ValueType};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Sign-extend `value` from `bit_size` bits to the full 64-bit pattern.
pub(crate) fn sign_extend(value: u64, bit_size: u64) -> u64 {
    if bit_size >= 64 {
        return value;
    }
    let sign_bit = 1u64 << (bit_size - 1);
    if value & sign_bit != 0 {
        value | !((1u64 << bit_size) - 1)
    } else {
        value
    }
}

impl Signal {
    /// Linear position of the field's LSB in the loaded word.
    ///
    /// For Motorola signals the start bit names the MSB in sawtooth
    /// numbering; after the big-endian word load it sits at
    /// `8*(7 - start/8) + start%8`, and the LSB is `bit_size - 1` below it.
    /// The builder guarantees the subtraction cannot underflow.
    fn lsb_position(&self) -> u32 {
        match self.byte_order {
            ByteOrder::LittleEndian => self.start_bit as u32,
            ByteOrder::BigEndian => {
                let msb = 8 * (7 - self.start_bit as u32 / 8) + self.start_bit as u32 % 8;
                msb + 1 - self.bit_size as u32
            }
        }
    }

    /// Field mask in LSB-aligned position. A 64-bit field has no mask.
    fn bit_mask(&self) -> u64 {
        if self.bit_size == 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_size) - 1
        }
    }

    /// Extract the signal's raw bits from an 8-byte payload.
    ///
    /// The result carries the field in the low `bit_size` bits; signed
    /// signals come back sign-extended, float signals as their IEEE bit
    /// pattern. Never fails: the builder pinned the field inside the
    /// payload window.
    pub fn decode(&self, data: &[u8; 8]) -> u64 {
        let word = match self.byte_order {
            ByteOrder::LittleEndian => LittleEndian::read_u64(data),
            ByteOrder::BigEndian => BigEndian::read_u64(data),
        };
        let raw = (word >> self.lsb_position()) & self.bit_mask();
        match self.value_type {
            ValueType::Signed => sign_extend(raw, self.bit_size),
            _ => raw,
        }
    }

    /// Insert `raw` into the payload at the signal's position.
    ///
    /// Bits outside the field are preserved; bits of `raw` above `bit_size`
    /// are ignored.
    pub fn encode(&self, raw: u64, data: &mut [u8; 8]) {
        let shift = self.lsb_position();
        let field = (raw & self.bit_mask()) << shift;
        let keep = !(self.bit_mask() << shift);
        match self.byte_order {
            ByteOrder::LittleEndian => {
                let word = LittleEndian::read_u64(data) & keep | field;
                LittleEndian::write_u64(data, word);
            }
            ByteOrder::BigEndian => {
                let word = BigEndian::read_u64(data) & keep | field;
                BigEndian::write_u64(data, word);
            }
        }
    }

    /// Map a raw bit pattern to the physical value.
    pub fn raw_to_phys(&self, raw: u64) -> f64 {
        let value = match self.value_type {
            ValueType::Unsigned => raw as f64,
            ValueType::Signed => raw as i64 as f64,
            ValueType::IeeeFloat32 => f32::from_bits(raw as u32) as f64,
            ValueType::IeeeFloat64 => f64::from_bits(raw),
        };
        value * self.factor + self.offset
    }

    /// Inverse of [`raw_to_phys`](Self::raw_to_phys), truncating toward
    /// zero for the integer value types.
    pub fn phys_to_raw(&self, phys: f64) -> u64 {
        let value = (phys - self.offset) / self.factor;
        match self.value_type {
            ValueType::Unsigned => value as u64,
            ValueType::Signed => value as i64 as u64,
            ValueType::IeeeFloat32 => (value as f32).to_bits() as u64,
            ValueType::IeeeFloat64 => value.to_bits(),
        }
    }

    /// Decode straight to the physical value.
    pub fn decode_phys(&self, data: &[u8; 8]) -> f64 {
        self.raw_to_phys(self.decode(data))
    }
}
