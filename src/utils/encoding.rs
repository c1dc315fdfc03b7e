//! Variable-length integer encoding helpers.
//!
//! These are the writing counterparts of [`crate::file::parser::Parser::read_7bit_encoded_int`]
//! and [`crate::file::parser::Parser::read_zigzag_int`]. Sequence-point blobs store offsets as
//! deltas against the previously retained point; because points are not sorted by offset those
//! deltas can be negative, so they are zig-zag mapped onto non-negative values before being
//! written as 7-bit encoded integers.

/// Maps a signed value onto an unsigned one so that small magnitudes stay small.
///
/// `0, -1, 1, -2, 2, ...` become `0, 1, 2, 3, 4, ...`.
#[must_use]
#[inline]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[must_use]
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Appends `value` as a 7-bit encoded integer to `buffer`.
///
/// Each byte carries 7 bits of payload, least significant group first, with the high bit
/// set on every byte except the last. Values below 128 take a single byte, `u32::MAX`
/// takes five.
pub fn write_7bit_encoded_int(value: u32, buffer: &mut Vec<u8>) {
    let mut remaining = value;
    while remaining >= 0x80 {
        #[allow(clippy::cast_possible_truncation)]
        buffer.push((remaining as u8 & 0x7F) | 0x80);
        remaining >>= 7;
    }
    #[allow(clippy::cast_possible_truncation)]
    buffer.push(remaining as u8);
}

/// Appends `value` zig-zag mapped and 7-bit encoded to `buffer`.
pub fn write_zigzag_int(value: i32, buffer: &mut Vec<u8>) {
    write_7bit_encoded_int(zigzag_encode(value), buffer);
}

/// Returns the number of bytes [`write_7bit_encoded_int`] emits for `value`.
#[must_use]
pub const fn encoded_int_size(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}
