//! Basic blocks as seen by the sequence-point pass.
//!
//! Code generation owns the real blocks; the pass only needs the sequence-point
//! instructions each block contains, its edges, and whether it is adjacent to an
//! `endfinally`, whose control transfer is not represented by explicit edges.

use std::fmt;

/// Identifier of a basic block, equal to its position in layout order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Creates a new `BlockId` from a layout index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        BlockId(index)
    }

    /// Returns the layout index of this block.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BB{}", self.0)
    }
}

/// Identity of a sequence-point instruction emitted by code generation.
///
/// The same instruction is referenced from the method-wide collection list and from the
/// block that contains it; the pass maps it to a dense point id through a side table
/// instead of storing anything on the instruction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct InstId(pub u32);

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// A basic block of a compiled method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Layout position of this block
    pub id: BlockId,
    /// Sequence-point instructions of the block in program order
    pub seq_points: Vec<InstId>,
    /// The last sequence point recorded in this block; dead code is skipped when the
    /// block's exit point is resolved
    pub last_seq_point: Option<InstId>,
    /// Incoming edges; the same predecessor may be listed more than once
    pub predecessors: Vec<BlockId>,
    /// Outgoing edges
    pub successors: Vec<BlockId>,
    /// The terminating instruction is an `endfinally`
    pub ends_with_endfinally: bool,
    /// The first instruction is an `endfinally`
    pub begins_with_endfinally: bool,
}

impl BasicBlock {
    /// Creates an empty block without edges or sequence points.
    #[must_use]
    pub fn new(id: BlockId) -> Self {
        BasicBlock {
            id,
            seq_points: Vec::new(),
            last_seq_point: None,
            predecessors: Vec::new(),
            successors: Vec::new(),
            ends_with_endfinally: false,
            begins_with_endfinally: false,
        }
    }

    /// Returns true if the block contains at least one sequence point.
    #[must_use]
    pub fn has_seq_points(&self) -> bool {
        !self.seq_points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_formatting() {
        let id = BlockId::new(3);
        assert_eq!(id.index(), 3);
        assert_eq!(format!("{id}"), "BB3");
        assert_eq!(format!("{id:?}"), "BlockId(3)");
    }

    #[test]
    fn new_block_is_empty() {
        let block = BasicBlock::new(BlockId::new(0));
        assert!(!block.has_seq_points());
        assert!(block.last_seq_point.is_none());
        assert!(block.predecessors.is_empty());
        assert!(!block.ends_with_endfinally);
    }
}
