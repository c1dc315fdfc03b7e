//! Sequence-point tables of compiled methods.
//!
//! After code generation every compiled method carries a list of sequence points, each
//! mapping an IL offset to the native offset the JIT emitted for it. This module turns that
//! list into a compact, searchable blob and, when a debugger is attached, records for every
//! point the set of points that can be reached next ("step-over" successors).
//!
//! # Architecture
//!
//! The pass runs once per compiled method, single-threaded, as one step of compilation:
//!
//! 1. [`PointTable`] - collects the points in pass order and assigns dense ids
//! 2. [`build_successor_map`] - walks the CFG and produces a [`SuccessorMap`]
//! 3. [`SeqPointInfoBuilder`] - delta-encodes the table into a [`SeqPointInfo`] blob
//! 4. [`save_seq_point_info`] - orchestrates the above and registers the blob with the
//!    owning [`crate::runtime::Domain`]
//!
//! Blobs of ahead-of-time compiled images are persisted in a [`SeqPointData`] side file
//! instead, see [`aot_seq_point_path`].
//!
//! # Markers and dead code
//!
//! Two IL offsets are reserved for method entry and exit events
//! ([`METHOD_ENTRY_IL_OFFSET`], [`METHOD_EXIT_IL_OFFSET`]) and one native offset marks points
//! whose code was eliminated after they were recorded ([`SEQ_POINT_NATIVE_OFFSET_DEAD_CODE`]).
//! Such points keep their slot in the table and the blob, but never take part in step-over
//! chains.
//!
//! # Examples
//!
//! ```rust
//! use seqpoints::seqpoints::{SeqPointInfoBuilder, SequencePoint};
//!
//! let mut builder = SeqPointInfoBuilder::new(false);
//! for (il, native) in [(0, 10), (4, 20), (9, 30)] {
//!     builder.add_seq_point(&SequencePoint::new(il, native), &[]);
//! }
//! let info = builder.finish();
//!
//! assert_eq!(info.find_next_by_native_offset(15).unwrap().point.native_offset, 20);
//! assert_eq!(info.find_prev_by_native_offset(15).unwrap().point.native_offset, 10);
//! assert!(info.find_next_by_native_offset(31).is_none());
//! ```

mod data;
mod encoder;
mod info;
mod pass;
mod successors;
mod table;

pub use data::{aot_seq_point_path, SeqPointData, SeqPointDataEntry, SEQ_POINT_AOT_EXT};
pub use encoder::{add_seq_point, SeqPointInfoBuilder};
pub use info::{SeqPointEntry, SeqPointInfo, SeqPointIter};
pub use pass::{save_seq_point_info, seq_point_map_lines, CompileUnit};
pub use successors::{build_successor_map, SuccessorGraphBuilder, SuccessorMap, Visit};
pub use table::{PointId, PointTable};

use bitflags::bitflags;

use crate::analysis::cfg::InstId;

/// IL offset of the marker emitted for the method entry event.
pub const METHOD_ENTRY_IL_OFFSET: i32 = -1;

/// IL offset of the marker emitted for the method exit event.
pub const METHOD_EXIT_IL_OFFSET: i32 = 0x00FF_FFFF;

/// Native offset of a point whose code was removed after the point was recorded.
pub const SEQ_POINT_NATIVE_OFFSET_DEAD_CODE: i32 = -1;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Per-point flags stored alongside the offsets
    pub struct SeqPointFlags: u32 {
        /// The evaluation stack is not empty at this point
        const NONEMPTY_STACK = 0x1;
    }
}

/// A mapping between an IL offset and the native code generated for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequencePoint {
    /// Offset in the method's IL stream, or one of the entry/exit markers
    pub il_offset: i32,
    /// Offset in the generated native code, or [`SEQ_POINT_NATIVE_OFFSET_DEAD_CODE`]
    pub native_offset: i32,
    /// Additional properties of the point
    pub flags: SeqPointFlags,
}

impl SequencePoint {
    /// Creates a point without flags.
    #[must_use]
    pub const fn new(il_offset: i32, native_offset: i32) -> Self {
        SequencePoint {
            il_offset,
            native_offset,
            flags: SeqPointFlags::empty(),
        }
    }

    /// Returns a copy of this point with `flags` set.
    #[must_use]
    pub const fn with_flags(mut self, flags: SeqPointFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns true for the method entry marker.
    #[must_use]
    pub const fn is_method_entry(&self) -> bool {
        self.il_offset == METHOD_ENTRY_IL_OFFSET
    }

    /// Returns true for the method exit marker.
    #[must_use]
    pub const fn is_method_exit(&self) -> bool {
        self.il_offset == METHOD_EXIT_IL_OFFSET
    }

    /// Returns true for either entry or exit marker.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        self.is_method_entry() || self.is_method_exit()
    }

    /// Returns true if the native code of this point was eliminated.
    #[must_use]
    pub const fn is_dead_code(&self) -> bool {
        self.native_offset == SEQ_POINT_NATIVE_OFFSET_DEAD_CODE
    }

    /// Returns true if the point can be stepped to: neither a marker nor dead code.
    #[must_use]
    pub const fn is_steppable(&self) -> bool {
        !self.is_marker() && !self.is_dead_code()
    }

    /// Returns true if the evaluation stack is not empty at this point.
    #[must_use]
    pub const fn has_nonempty_stack(&self) -> bool {
        self.flags.contains(SeqPointFlags::NONEMPTY_STACK)
    }
}

/// A sequence point as collected by code generation, still tied to its instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqPointInst {
    /// The instruction that recorded the point
    pub inst: InstId,
    /// The recorded offsets and flags
    pub point: SequencePoint,
}

impl SeqPointInst {
    /// Creates a collected point.
    #[must_use]
    pub const fn new(inst: InstId, point: SequencePoint) -> Self {
        SeqPointInst { inst, point }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_and_dead_code() {
        let entry = SequencePoint::new(METHOD_ENTRY_IL_OFFSET, 0);
        let exit = SequencePoint::new(METHOD_EXIT_IL_OFFSET, 40);
        let dead = SequencePoint::new(12, SEQ_POINT_NATIVE_OFFSET_DEAD_CODE);
        let plain = SequencePoint::new(12, 30);

        assert!(entry.is_method_entry() && entry.is_marker() && !entry.is_steppable());
        assert!(exit.is_method_exit() && exit.is_marker());
        assert!(dead.is_dead_code() && !dead.is_marker() && !dead.is_steppable());
        assert!(plain.is_steppable());
    }

    #[test]
    fn nonempty_stack_flag() {
        let point = SequencePoint::new(3, 9);
        assert!(!point.has_nonempty_stack());

        let point = point.with_flags(SeqPointFlags::NONEMPTY_STACK);
        assert!(point.has_nonempty_stack());
        assert_eq!(point.flags.bits(), 1);
    }
}
