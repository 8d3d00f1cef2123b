//! Numeric interpretation of extracted bit fields
//!
//! Turns the raw `u64` produced by [`crate::bits`] into a physical value:
//! sign extension for signed integers, IEEE-754 bit reinterpretation for
//! floats, then `raw * factor + offset`.

use crate::bits::{extract_bits, MAX_SIGNAL_BITS};
use crate::signals::{ByteOrder, SignalDefinition, ValueKind};

/// Width of a single precision float field
pub const SP_FLOAT_BITS: usize = 32;

/// Width of a double precision float field
pub const DP_FLOAT_BITS: usize = 64;

/// Sign-extend a value from `bit_length` bits to 64 bits
///
/// The top bit of the field is the sign bit. A zero-width field is zero.
pub fn sign_extend(value: u64, bit_length: usize) -> i64 {
    if bit_length == 0 {
        return 0;
    }
    if bit_length >= MAX_SIGNAL_BITS {
        return value as i64;
    }

    let shift = (MAX_SIGNAL_BITS - bit_length) as u32;
    ((value << shift) as i64) >> shift
}

/// Reinterpret the low 32 bits as an IEEE-754 single
pub fn reinterpret_f32(raw: u64) -> f32 {
    f32::from_bits(raw as u32)
}

/// Reinterpret all 64 bits as an IEEE-754 double
pub fn reinterpret_f64(raw: u64) -> f64 {
    f64::from_bits(raw)
}

/// Affine scaling from raw to physical units
#[inline]
pub fn scale(value: f64, factor: f64, offset: f64) -> f64 {
    value * factor + offset
}

/// The bit span a signal of this kind reads: start bit, width and byte order
///
/// Integer kinds read their own span. Single floats always read 32 bits from
/// the start bit as a Motorola field, whatever byte order the signal declares.
/// Double floats read the first 8 bytes of the payload; the start bit is the
/// first bit of byte 0 in the signal's own numbering. `None` for string
/// signals, which copy bytes instead.
pub fn field_span(signal: &SignalDefinition) -> Option<(usize, usize, ByteOrder)> {
    match signal.value_kind {
        ValueKind::SignedInt | ValueKind::UnsignedInt => Some((
            signal.start_bit as usize,
            signal.length as usize,
            signal.byte_order,
        )),
        ValueKind::SpFloat => Some((signal.start_bit as usize, SP_FLOAT_BITS, ByteOrder::Motorola)),
        ValueKind::DpFloat => {
            let start = match signal.byte_order {
                ByteOrder::Intel => 0,
                ByteOrder::Motorola => 7,
            };
            Some((start, DP_FLOAT_BITS, signal.byte_order))
        }
        ValueKind::StringBytes => None,
    }
}

/// Bits the frame must provide before the signal may be read
pub fn required_bits(signal: &SignalDefinition) -> Option<usize> {
    match signal.value_kind {
        ValueKind::SignedInt | ValueKind::UnsignedInt => {
            Some(signal.start_bit as usize + signal.length as usize)
        }
        ValueKind::SpFloat => Some(signal.start_bit as usize + SP_FLOAT_BITS),
        ValueKind::DpFloat => Some(DP_FLOAT_BITS),
        ValueKind::StringBytes => None,
    }
}

/// Extract the raw field of a numeric signal
pub fn extract_raw(data: &[u8], signal: &SignalDefinition) -> Option<u64> {
    let (start, length, order) = field_span(signal)?;
    Some(extract_bits(data, start, length, order))
}

/// Interpret a raw field according to the signal's kind, before scaling
pub fn interpret(raw: u64, signal: &SignalDefinition) -> Option<f64> {
    match signal.value_kind {
        ValueKind::SignedInt => Some(sign_extend(raw, signal.length as usize) as f64),
        ValueKind::UnsignedInt => Some(raw as f64),
        ValueKind::SpFloat => Some(reinterpret_f32(raw) as f64),
        ValueKind::DpFloat => Some(reinterpret_f64(raw)),
        ValueKind::StringBytes => None,
    }
}

/// Interpret and scale a raw field into its physical value
pub fn physical_value(raw: u64, signal: &SignalDefinition) -> Option<f64> {
    interpret(raw, signal).map(|value| scale(value, signal.factor, signal.offset))
}
