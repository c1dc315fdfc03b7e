//! Low-level byte stream parser for sequence-point blobs and side files.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data parser
//! used to decode [`crate::seqpoints::SeqPointInfo`] blobs and `.msym` side files. It offers
//! bounds-checked access to binary data and understands the variable-length integer encodings
//! written by [`crate::utils::write_7bit_encoded_int`] and [`crate::utils::write_zigzag_int`].
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to specific position
//! - [`crate::file::parser::Parser::pos`] - Get current position
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_u8`] - Read a single byte
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a run of bytes
//! - [`crate::file::parser::Parser::read_7bit_encoded_int`] - Read 7-bit encoded integers
//! - [`crate::file::parser::Parser::read_zigzag_int`] - Read zig-zag encoded signed integers
//!
//! # Usage Examples
//!
//! ```rust
//! use seqpoints::Parser;
//!
//! // 300 as a 7-bit encoded integer, followed by -2 in zig-zag form
//! let data = [0xAC, 0x02, 0x03];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_7bit_encoded_int()?, 300);
//! assert_eq!(parser.read_zigzag_int()?, -2);
//! assert!(!parser.has_more_data());
//! # Ok::<(), seqpoints::Error>(())
//! ```

use crate::{utils::zigzag_decode, Result};

/// A cursor over a byte slice with bounds-checked reads.
///
/// The parser maintains an internal position cursor and provides bounds checking
/// to prevent buffer overruns when reading malformed or truncated data. Reads never
/// panic; every failure is reported as [`crate::Error::OutOfBounds`] or
/// [`crate::Error::Malformed`].
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if there are bytes left to read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to an absolute position.
    ///
    /// Seeking to `len()` is permitted and leaves the parser exhausted.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies beyond the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Returns the current position of the cursor.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read a single byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the parser is exhausted.
    pub fn read_u8(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.position) else {
            return Err(out_of_bounds_error!());
        };

        self.position += 1;
        Ok(byte)
    }

    /// Read a 7-bit encoded integer.
    ///
    /// This encoding uses the most significant bit of each byte as a continuation flag.
    /// If set, the next byte is part of the value. The value is reconstructed by
    /// concatenating the lower 7 bits of each byte in little-endian order.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] if the value does not fit into a `u32`.
    pub fn read_7bit_encoded_int(&mut self) -> Result<u32> {
        let mut value = 0u32;
        let mut shift = 0;

        loop {
            let byte = self.read_u8()?;

            // The fifth byte may only carry the remaining 4 bits of a u32.
            if shift == 28 && (byte & 0x70) != 0 {
                return Err(malformed_error!(
                    "7-bit encoded integer overflow: byte 0x{:02X} exceeds u32 capacity",
                    byte
                ));
            }

            value |= u32::from(byte & 0x7F) << shift;
            shift += 7;

            if (byte & 0x80) == 0 {
                break;
            }

            if shift >= 32 {
                return Err(malformed_error!(
                    "7-bit encoded integer overflow: value exceeds u32 capacity after {} bits",
                    shift
                ));
            }
        }

        Ok(value)
    }

    /// Read a zig-zag encoded signed integer stored as a 7-bit encoded integer.
    ///
    /// # Errors
    /// Same as [`Parser::read_7bit_encoded_int`].
    pub fn read_zigzag_int(&mut self) -> Result<i32> {
        Ok(zigzag_decode(self.read_7bit_encoded_int()?))
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }
}
