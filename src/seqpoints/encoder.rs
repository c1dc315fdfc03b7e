//! Delta encoder producing [`SeqPointInfo`] blobs.
//!
//! Each retained point is stored relative to the previously retained one:
//!
//! ```text
//! zigzag(il_offset - last.il_offset)          varint
//! zigzag(native_offset - last.native_offset)  varint
//! flags                                       varint
//! [successor count, successor ids...]         varints, only with debug data
//! ```
//!
//! The first point is stored relative to `(0, 0)`.

use crate::{
    seqpoints::{PointId, SeqPointInfo, SequencePoint},
    utils::{write_7bit_encoded_int, write_zigzag_int},
};

/// Appends `point` to `buffer` unless it duplicates `last`.
///
/// Without debug data a point whose IL and native offsets both equal those of the last
/// retained point carries no information and is rejected. With debug data every point is
/// kept, because successor ids refer to points by position. The successor list is only
/// written when `has_debug_data` is set.
///
/// The first point (`last` is `None`) is always kept, even a leading `(0, 0)` point that a
/// comparison against a zeroed base would drop. Its deltas are still taken from `(0, 0)`.
///
/// Returns whether the point was appended; callers only advance their `last` on `true`.
pub fn add_seq_point(
    buffer: &mut Vec<u8>,
    point: &SequencePoint,
    last: Option<&SequencePoint>,
    next: &[PointId],
    has_debug_data: bool,
) -> bool {
    let base = last.copied().unwrap_or(SequencePoint::new(0, 0));

    if !has_debug_data
        && last.is_some()
        && base.il_offset == point.il_offset
        && base.native_offset == point.native_offset
    {
        return false;
    }

    write_zigzag_int(point.il_offset.wrapping_sub(base.il_offset), buffer);
    write_zigzag_int(point.native_offset.wrapping_sub(base.native_offset), buffer);
    write_7bit_encoded_int(point.flags.bits(), buffer);

    if has_debug_data {
        // Successor sets are bounded by the table size, which fits into u32
        #[allow(clippy::cast_possible_truncation)]
        write_7bit_encoded_int(next.len() as u32, buffer);
        for id in next {
            write_7bit_encoded_int(id.0, buffer);
        }
    }

    true
}

/// Incremental builder for a [`SeqPointInfo`].
///
/// ```rust
/// use seqpoints::seqpoints::{SeqPointInfoBuilder, SequencePoint};
///
/// let mut builder = SeqPointInfoBuilder::new(false);
/// assert!(builder.add_seq_point(&SequencePoint::new(0, 4), &[]));
/// assert!(!builder.add_seq_point(&SequencePoint::new(0, 4), &[]));
/// assert!(builder.add_seq_point(&SequencePoint::new(2, 4), &[]));
///
/// let info = builder.finish();
/// assert_eq!(info.iter().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SeqPointInfoBuilder {
    data: Vec<u8>,
    last: Option<SequencePoint>,
    retained: usize,
    has_debug_data: bool,
}

impl SeqPointInfoBuilder {
    /// Creates a builder; `has_debug_data` selects whether successor lists are stored.
    #[must_use]
    pub fn new(has_debug_data: bool) -> Self {
        SeqPointInfoBuilder {
            data: Vec::new(),
            last: None,
            retained: 0,
            has_debug_data,
        }
    }

    /// Creates a builder with room for roughly `points` entries.
    #[must_use]
    pub fn with_capacity(has_debug_data: bool, points: usize) -> Self {
        let mut builder = Self::new(has_debug_data);
        // Three single-byte varints per point is the common case
        builder.data.reserve(points * 3);
        builder
    }

    /// Appends `point` with its successors, returns whether it was retained.
    pub fn add_seq_point(&mut self, point: &SequencePoint, next: &[PointId]) -> bool {
        let retained = add_seq_point(
            &mut self.data,
            point,
            self.last.as_ref(),
            next,
            self.has_debug_data,
        );

        if retained {
            self.last = Some(*point);
            self.retained += 1;
        }
        retained
    }

    /// Returns the number of retained points so far.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Returns true if successor lists are being written.
    #[must_use]
    pub fn has_debug_data(&self) -> bool {
        self.has_debug_data
    }

    /// Seals the builder into an immutable blob.
    #[must_use]
    pub fn finish(self) -> SeqPointInfo {
        SeqPointInfo::from_parts(&self.data, self.has_debug_data, self.retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqpoints::{SeqPointFlags, METHOD_ENTRY_IL_OFFSET, METHOD_EXIT_IL_OFFSET};

    #[test]
    fn first_point_is_always_retained() {
        let mut builder = SeqPointInfoBuilder::new(false);
        assert!(builder.add_seq_point(&SequencePoint::new(0, 0), &[]));
        assert_eq!(builder.retained(), 1);
    }

    #[test]
    fn duplicates_only_rejected_against_last_retained() {
        let mut builder = SeqPointInfoBuilder::new(false);
        assert!(builder.add_seq_point(&SequencePoint::new(1, 10), &[]));
        assert!(!builder.add_seq_point(&SequencePoint::new(1, 10), &[]));
        assert!(builder.add_seq_point(&SequencePoint::new(1, 12), &[]));
        // Same as the first point, but not the last retained one
        assert!(builder.add_seq_point(&SequencePoint::new(1, 10), &[]));
        assert_eq!(builder.retained(), 3);

        let natives: Vec<_> = builder
            .finish()
            .iter()
            .map(|entry| entry.point.native_offset)
            .collect();
        assert_eq!(natives, vec![10, 12, 10]);
    }

    #[test]
    fn flags_do_not_prevent_rejection() {
        let mut builder = SeqPointInfoBuilder::new(false);
        assert!(builder.add_seq_point(&SequencePoint::new(3, 6), &[]));
        let flagged = SequencePoint::new(3, 6).with_flags(SeqPointFlags::NONEMPTY_STACK);
        assert!(!builder.add_seq_point(&flagged, &[]));
    }

    #[test]
    fn debug_data_keeps_duplicates() {
        let mut builder = SeqPointInfoBuilder::new(true);
        assert!(builder.add_seq_point(&SequencePoint::new(1, 10), &[PointId(1)]));
        assert!(builder.add_seq_point(&SequencePoint::new(1, 10), &[]));

        let info = builder.finish();
        assert!(info.has_debug_data());
        assert_eq!(info.point_count(), 2);
    }

    #[test]
    fn raw_layout() {
        let mut data = Vec::new();
        let first = SequencePoint::new(2, 5);
        assert!(add_seq_point(&mut data, &first, None, &[PointId(3)], true));
        // zigzag(2)=4, zigzag(5)=10, flags 0, one successor, id 3
        assert_eq!(data, vec![4, 10, 0, 1, 3]);

        data.clear();
        let second = SequencePoint::new(0, 9);
        assert!(add_seq_point(&mut data, &second, Some(&first), &[PointId(3)], false));
        // zigzag(-2)=3, zigzag(4)=8, no successor list
        assert_eq!(data, vec![3, 8, 0]);
    }

    #[test]
    fn extreme_offsets_survive() {
        let points = [
            SequencePoint::new(METHOD_ENTRY_IL_OFFSET, 0),
            SequencePoint::new(i32::MAX, i32::MIN),
            SequencePoint::new(i32::MIN, i32::MAX),
            SequencePoint::new(METHOD_EXIT_IL_OFFSET, -1),
        ];

        let mut builder = SeqPointInfoBuilder::new(false);
        for point in &points {
            assert!(builder.add_seq_point(point, &[]));
        }

        let decoded: Vec<_> = builder.finish().iter().map(|entry| entry.point).collect();
        assert_eq!(decoded, points);
    }
}
