//! Method control-flow graph in block layout order.

use crate::{
    analysis::cfg::{BasicBlock, BlockId, InstId},
    Error::GraphError,
    Result,
};

/// The control-flow graph of one compiled method.
///
/// Blocks are stored in layout order and a block's [`BlockId`] is its position in that
/// order. Edges are recorded on both endpoints: [`MethodCfg::add_edge`] appends to the
/// source's successor list and to the target's predecessor list, so adding the same edge
/// twice yields a duplicate predecessor entry exactly like a switch with two cases jumping
/// to the same target.
///
/// # Construction
///
/// ```rust
/// use seqpoints::analysis::{InstId, MethodCfg};
///
/// let mut cfg = MethodCfg::new();
/// let entry = cfg.add_block();
/// let body = cfg.add_block();
/// cfg.add_edge(entry, body)?;
/// cfg.push_seq_point(entry, InstId(0))?;
/// cfg.push_seq_point(body, InstId(1))?;
///
/// assert_eq!(cfg.block_count(), 2);
/// assert_eq!(cfg.block(body).unwrap().predecessors, vec![entry]);
/// # Ok::<(), seqpoints::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodCfg {
    blocks: Vec<BasicBlock>,
}

impl MethodCfg {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        MethodCfg { blocks: Vec::new() }
    }

    /// Creates a graph from blocks that already carry their edges.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if a block's id does not match its position or
    /// an edge references a block outside the graph.
    pub fn from_blocks(blocks: Vec<BasicBlock>) -> Result<Self> {
        let block_count = blocks.len();

        for (index, block) in blocks.iter().enumerate() {
            if block.id.index() != index {
                return Err(GraphError(format!(
                    "Block at layout position {index} carries id {}",
                    block.id
                )));
            }

            for edge in block.predecessors.iter().chain(block.successors.iter()) {
                if edge.index() >= block_count {
                    return Err(GraphError(format!(
                        "Block {} references {edge} which exceeds block count {block_count}",
                        block.id
                    )));
                }
            }
        }

        Ok(MethodCfg { blocks })
    }

    /// Appends a new empty block at the end of the layout and returns its id.
    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(BasicBlock::new(id));
        id
    }

    /// Adds the edge `from -> to`.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if either block does not exist.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) -> Result<()> {
        self.ensure_block(from)?;
        self.ensure_block(to)?;

        self.blocks[from.index()].successors.push(to);
        self.blocks[to.index()].predecessors.push(from);
        Ok(())
    }

    /// Appends a sequence-point instruction to `block` and makes it the block's last one.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if the block does not exist.
    pub fn push_seq_point(&mut self, block: BlockId, inst: InstId) -> Result<()> {
        self.ensure_block(block)?;

        let block = &mut self.blocks[block.index()];
        block.seq_points.push(inst);
        block.last_seq_point = Some(inst);
        Ok(())
    }

    /// Returns the block with the given id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Returns the block with the given id for modification.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(id.index())
    }

    /// Returns all blocks in layout order.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the graph has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn ensure_block(&self, id: BlockId) -> Result<()> {
        if id.index() >= self.blocks.len() {
            return Err(GraphError(format!(
                "Block {id} does not exist, graph has {} blocks",
                self.blocks.len()
            )));
        }
        Ok(())
    }
}
