//! Bit field extraction
//!
//! Bits are numbered in a sawtooth manner: byte 0 holds bits 0..=7 with bit 0
//! as its least significant bit, byte 1 holds bits 8..=15, and so on.
//!
//! ```text
//!                  Bits
//!       7  6  5  4  3  2  1  0
//!   0   7  6  5  4  3  2  1  0
//! b 1   15 14 13 12 11 10 9  8
//! y 2   23 22 21 20 19 18 17 16
//! t 3   31 30 29 28 27 26 25 24
//! e 4   39 38 37 36 35 34 33 32
//! s 5   47 46 45 44 43 42 41 40
//!   6   55 54 53 52 51 50 49 48
//!   7   63 62 61 60 59 58 57 56
//! ```
//!
//! Intel signals count upward from the start bit and the first bit is the LSB.
//! A signal of 8 bits at start bit 12 reads bits 12..=19, bit 12 worth 1 and
//! bit 19 worth 128.
//!
//! Motorola signals count downward from the start bit, but only inside the
//! current byte; past bit 0 of a byte they continue at bit 7 of the next byte.
//! The first bit is the MSB. The same 8 bits at start bit 12 are
//! 12, 11, 10, 9, 8, 23, 22, 21, with bit 12 worth 128 and bit 21 worth 1.

use crate::signals::ByteOrder;

/// Widest field a single extraction can produce
pub const MAX_SIGNAL_BITS: usize = 64;

/// Extract a raw unsigned bit field from `data`
///
/// Widths above 64 are clamped. Bits that fall outside `data` read as zero, so
/// this never panics; callers are still expected to check the frame length
/// first.
pub fn extract_bits(data: &[u8], start_bit: usize, length: usize, byte_order: ByteOrder) -> u64 {
    let length = length.min(MAX_SIGNAL_BITS);
    match byte_order {
        ByteOrder::Intel => extract_intel(data, start_bit, length),
        ByteOrder::Motorola => extract_motorola(data, start_bit, length),
    }
}

/// Read one bit by its sawtooth index
#[inline]
fn bit_at(data: &[u8], bit_pos: usize) -> u64 {
    data.get(bit_pos / 8)
        .map(|byte| ((byte >> (bit_pos % 8)) & 0x01) as u64)
        .unwrap_or(0)
}

fn extract_intel(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;

    for i in 0..length {
        result |= bit_at(data, start_bit + i) << i;
    }

    result
}

fn extract_motorola(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;
    let mut bit_pos = start_bit;

    for i in 0..length {
        result |= bit_at(data, bit_pos) << (length - 1 - i);

        if bit_pos % 8 == 0 {
            // Low end of this byte reached: continue at the top of the next one
            bit_pos += 15;
        } else {
            bit_pos -= 1;
        }
    }

    result
}

/// Sawtooth indices visited by an extraction, most significant first
///
/// Useful for diagnostics when a signal layout looks wrong.
pub fn bit_positions(start_bit: usize, length: usize, byte_order: ByteOrder) -> Vec<usize> {
    let length = length.min(MAX_SIGNAL_BITS);
    match byte_order {
        ByteOrder::Intel => (start_bit..start_bit + length).rev().collect(),
        ByteOrder::Motorola => {
            let mut positions = Vec::with_capacity(length);
            let mut bit_pos = start_bit;
            for _ in 0..length {
                positions.push(bit_pos);
                bit_pos = if bit_pos % 8 == 0 { bit_pos + 15 } else { bit_pos - 1 };
            }
            positions
        }
    }
}
