//! The encoded sequence-point blob and its search operations.
//!
//! # Layout
//!
//! ```text
//! flags        varint   bit 0: successor lists present
//! data length  varint
//! data         one record per retained point, see [`crate::seqpoints::add_seq_point`]
//! ```
//!
//! Blobs are validated once when they enter the process ([`SeqPointInfo::from_bytes`]);
//! searching a validated blob never fails.

use crate::{
    file::parser::Parser,
    seqpoints::{PointId, SeqPointFlags, SequencePoint},
    utils::{encoded_int_size, write_7bit_encoded_int},
    Result,
};

const FLAG_HAS_DEBUG_DATA: u32 = 0x1;

/// A point decoded from a [`SeqPointInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqPointEntry {
    /// The decoded offsets and flags
    pub point: SequencePoint,
    /// Position in encoding order, which is also the id successor lists refer to
    pub index: usize,
    next_offset: usize,
    next_len: usize,
}

impl SeqPointEntry {
    /// Returns the number of step-over successors stored for this point.
    #[must_use]
    pub fn successor_count(&self) -> usize {
        self.next_len
    }
}

/// Immutable, compact sequence-point table of one compiled method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqPointInfo {
    raw: Box<[u8]>,
    data_start: usize,
    count: usize,
    has_debug_data: bool,
}

impl SeqPointInfo {
    /// Wraps encoded point records produced by the encoder.
    pub(crate) fn from_parts(data: &[u8], has_debug_data: bool, count: usize) -> Self {
        // Blobs live in memory next to the code they describe, they never reach 4 GiB
        #[allow(clippy::cast_possible_truncation)]
        let length = data.len() as u32;
        let mut raw = Vec::with_capacity(1 + encoded_int_size(length) + data.len());

        write_7bit_encoded_int(
            if has_debug_data { FLAG_HAS_DEBUG_DATA } else { 0 },
            &mut raw,
        );
        write_7bit_encoded_int(length, &mut raw);

        let data_start = raw.len();
        raw.extend_from_slice(data);

        SeqPointInfo {
            raw: raw.into_boxed_slice(),
            data_start,
            count,
            has_debug_data,
        }
    }

    /// Decodes and validates a blob that spans all of `bytes`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated input and
    /// [`crate::Error::Malformed`] for unknown flags, invalid varints, successor ids that do
    /// not name a point, or trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(bytes);
        let info = Self::read(&mut parser)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after sequence point data",
                parser.remaining()
            ));
        }

        Ok(info)
    }

    /// Decodes and validates one blob at the parser's position, leaving the parser
    /// directly behind it.
    ///
    /// # Errors
    /// See [`SeqPointInfo::from_bytes`].
    pub fn read(parser: &mut Parser<'_>) -> Result<Self> {
        let flags = parser.read_7bit_encoded_int()?;
        if flags & !FLAG_HAS_DEBUG_DATA != 0 {
            return Err(malformed_error!(
                "Unknown sequence point blob flags 0x{:x}",
                flags
            ));
        }
        let has_debug_data = flags & FLAG_HAS_DEBUG_DATA != 0;

        let length = parser.read_7bit_encoded_int()? as usize;
        let data = parser.read_bytes(length)?;
        let count = Self::validate(data, has_debug_data)?;

        Ok(Self::from_parts(data, has_debug_data, count))
    }

    fn validate(data: &[u8], has_debug_data: bool) -> Result<usize> {
        let mut parser = Parser::new(data);
        let mut count = 0usize;
        let mut max_next: Option<u32> = None;

        while parser.has_more_data() {
            parser.read_zigzag_int()?;
            parser.read_zigzag_int()?;

            let flags = parser.read_7bit_encoded_int()?;
            if SeqPointFlags::from_bits(flags).is_none() {
                return Err(malformed_error!(
                    "Sequence point {} carries unknown flags 0x{:x}",
                    count,
                    flags
                ));
            }

            if has_debug_data {
                let next_len = parser.read_7bit_encoded_int()?;
                for _ in 0..next_len {
                    let id = parser.read_7bit_encoded_int()?;
                    max_next = max_next.max(Some(id));
                }
            }

            count += 1;
        }

        if let Some(id) = max_next {
            if id as usize >= count {
                return Err(malformed_error!(
                    "Successor id {} exceeds point count {}",
                    id,
                    count
                ));
            }
        }

        Ok(count)
    }

    /// Returns the encoded blob including its header.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the size of the encoded blob in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns true if the blob holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of retained points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.count
    }

    /// Returns true if successor lists are stored.
    #[must_use]
    pub fn has_debug_data(&self) -> bool {
        self.has_debug_data
    }

    fn data(&self) -> &[u8] {
        &self.raw[self.data_start..]
    }

    /// Iterates over all points in encoding order.
    #[must_use]
    pub fn iter(&self) -> SeqPointIter<'_> {
        SeqPointIter {
            parser: Parser::new(self.data()),
            last: SequencePoint::new(0, 0),
            index: 0,
            has_debug_data: self.has_debug_data,
        }
    }

    /// Returns the successor ids of `entry`, empty without debug data.
    #[must_use]
    pub fn next_ids(&self, entry: &SeqPointEntry) -> Vec<PointId> {
        let Some(bytes) = self.data().get(entry.next_offset..) else {
            return Vec::new();
        };

        let mut parser = Parser::new(bytes);
        (0..entry.next_len)
            .map_while(|_| parser.read_7bit_encoded_int().ok())
            .map(PointId)
            .collect()
    }

    /// Returns the first point, in encoding order, with the given IL offset.
    #[must_use]
    pub fn find_by_il_offset(&self, il_offset: i32) -> Option<SeqPointEntry> {
        self.iter().find(|entry| entry.point.il_offset == il_offset)
    }

    /// Returns the first point, in encoding order, at or after `native_offset`.
    #[must_use]
    pub fn find_next_by_native_offset(&self, native_offset: i32) -> Option<SeqPointEntry> {
        self.iter()
            .find(|entry| entry.point.native_offset >= native_offset)
    }

    /// Returns the last point at or before `native_offset`.
    ///
    /// The scan runs in encoding order and stops at the first point past `native_offset`,
    /// so for unsorted tables the result is the last point of the leading run that does not
    /// exceed it.
    #[must_use]
    pub fn find_prev_by_native_offset(&self, native_offset: i32) -> Option<SeqPointEntry> {
        self.iter()
            .take_while(|entry| entry.point.native_offset <= native_offset)
            .last()
    }
}

impl<'a> IntoIterator for &'a SeqPointInfo {
    type Item = SeqPointEntry;
    type IntoIter = SeqPointIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the points of a [`SeqPointInfo`] in encoding order.
pub struct SeqPointIter<'a> {
    parser: Parser<'a>,
    last: SequencePoint,
    index: usize,
    has_debug_data: bool,
}

impl SeqPointIter<'_> {
    fn decode_next(&mut self) -> Result<SeqPointEntry> {
        let il_delta = self.parser.read_zigzag_int()?;
        let native_delta = self.parser.read_zigzag_int()?;
        let flags = SeqPointFlags::from_bits_retain(self.parser.read_7bit_encoded_int()?);

        let point = SequencePoint {
            il_offset: self.last.il_offset.wrapping_add(il_delta),
            native_offset: self.last.native_offset.wrapping_add(native_delta),
            flags,
        };

        let (next_offset, next_len) = if self.has_debug_data {
            let next_len = self.parser.read_7bit_encoded_int()? as usize;
            let next_offset = self.parser.pos();
            for _ in 0..next_len {
                self.parser.read_7bit_encoded_int()?;
            }
            (next_offset, next_len)
        } else {
            (self.parser.pos(), 0)
        };

        let entry = SeqPointEntry {
            point,
            index: self.index,
            next_offset,
            next_len,
        };
        self.last = point;
        self.index += 1;
        Ok(entry)
    }
}

impl Iterator for SeqPointIter<'_> {
    type Item = SeqPointEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.parser.has_more_data() {
            return None;
        }

        match self.decode_next() {
            Ok(entry) => Some(entry),
            Err(_) => {
                // Only reachable for blobs that skipped validation, stop for good
                let end = self.parser.len();
                self.parser.seek(end).ok()?;
                None
            }
        }
    }
}
