//! Step-over successor computation.
//!
//! For every sequence point the debugger needs the set of points it can reach as the next
//! debuggable location. Inside a basic block that is simply the following point; at block
//! boundaries the builder walks predecessor edges backwards until it finds blocks that end
//! in a sequence point. Blocks that fall into an `endfinally` get an extra set of edges,
//! because the CFG does not model where a finally handler returns to.
//!
//! The walk works on graphs of any shape. Loops, irreducible regions and duplicate
//! predecessor edges are expected input; the visitation table guarantees termination.

use crate::{
    analysis::cfg::{BasicBlock, BlockId, InstId, MethodCfg},
    seqpoints::{PointId, PointTable, SequencePoint},
    Error::GraphError,
    Result,
};

/// Step-over successors of every point of a [`PointTable`].
///
/// Each set is unordered and never contains duplicates. The order of a slice returned by
/// [`SuccessorMap::successors`] depends on the traversal and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessorMap {
    next: Vec<Vec<PointId>>,
}

impl SuccessorMap {
    /// Creates a map for `len` points with empty successor sets.
    #[must_use]
    pub fn new(len: usize) -> Self {
        SuccessorMap {
            next: vec![Vec::new(); len],
        }
    }

    /// Adds `to` to the successors of `from`.
    ///
    /// Returns `false` if the edge already exists, is a self-edge, or `from` is not part of
    /// the map.
    pub fn insert(&mut self, from: PointId, to: PointId) -> bool {
        if from == to {
            return false;
        }

        let Some(set) = self.next.get_mut(from.index()) else {
            return false;
        };

        if set.contains(&to) {
            return false;
        }

        set.push(to);
        true
    }

    /// Returns the successors of `id`, empty if it has none or is unknown.
    #[must_use]
    pub fn successors(&self, id: PointId) -> &[PointId] {
        self.next.get(id.index()).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of points the map covers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next.len()
    }

    /// Returns true if the map covers no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// Returns the total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.next.iter().map(Vec::len).sum()
    }

    /// Iterates over `(id, successors)` in id order, including points without successors.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &[PointId])> {
        // One entry per table slot, slots fit into u32
        #[allow(clippy::cast_possible_truncation)]
        self.next
            .iter()
            .enumerate()
            .map(|(slot, set)| (PointId(slot as u32), set.as_slice()))
    }
}

/// State of a block during one predecessor search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visit {
    /// Not entered during the current search
    #[default]
    Unvisited,
    /// Entered and still on the walk stack
    InProgress,
    /// Entered and fully explored
    Resolved,
}

struct Frame {
    block: BlockId,
    next_pred: usize,
}

/// Builds the [`SuccessorMap`] of one method.
///
/// The builder owns the scratch state of the predecessor search (visitation table, walk
/// stack and list of touched blocks) so it can be reused across every block of the method
/// without reallocating.
pub struct SuccessorGraphBuilder<'a> {
    cfg: &'a MethodCfg,
    table: &'a PointTable,
    map: SuccessorMap,
    visits: Vec<Visit>,
    stack: Vec<Frame>,
    touched: Vec<BlockId>,
}

impl<'a> SuccessorGraphBuilder<'a> {
    /// Creates a builder for `cfg` whose sequence-point instructions live in `table`.
    #[must_use]
    pub fn new(cfg: &'a MethodCfg, table: &'a PointTable) -> Self {
        SuccessorGraphBuilder {
            cfg,
            table,
            map: SuccessorMap::new(table.len()),
            visits: vec![Visit::Unvisited; cfg.block_count()],
            stack: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// Computes the successor sets of all points.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if a block references an instruction without a
    /// sequence point or a block outside the graph.
    pub fn build(mut self) -> Result<SuccessorMap> {
        if self.table.is_empty() || self.cfg.is_empty() {
            return Ok(self.map);
        }

        let cfg = self.cfg;
        for block in cfg.blocks() {
            let mut last: Option<PointId> = None;

            for &inst in &block.seq_points {
                let (id, point) = self.resolve(inst)?;
                if !point.is_steppable() {
                    continue;
                }

                match last {
                    Some(prev) => self.link(prev, id),
                    None => self.collect_pred_seq_points(block.id, id)?,
                }
                last = Some(id);
            }

            if self.flows_into_endfinally(block)? {
                self.link_endfinally(block)?;
            }
        }

        Ok(self.map)
    }

    /// Links the last sequence point of every block that can reach `start` through
    /// predecessor edges, without passing another sequence point, to `target`.
    fn collect_pred_seq_points(&mut self, start: BlockId, target: PointId) -> Result<()> {
        let cfg = self.cfg;
        self.stack.push(Frame {
            block: start,
            next_pred: 0,
        });

        while let Some(frame) = self.stack.last_mut() {
            let current = frame.block;
            let block = Self::block_of(cfg, current)?;

            let Some(&pred) = block.predecessors.get(frame.next_pred) else {
                self.stack.pop();
                if current != start {
                    self.visits[current.index()] = Visit::Resolved;
                }
                continue;
            };
            frame.next_pred += 1;

            let pred_block = Self::block_of(cfg, pred)?;
            if self.visits[pred.index()] != Visit::Unvisited {
                continue;
            }

            if let Some((source, _)) = self.exit_point(pred_block)? {
                self.link(source, target);
            } else {
                self.visits[pred.index()] = Visit::InProgress;
                self.touched.push(pred);
                self.stack.push(Frame {
                    block: pred,
                    next_pred: 0,
                });
            }
        }

        for block in self.touched.drain(..) {
            self.visits[block.index()] = Visit::Unvisited;
        }

        Ok(())
    }

    /// A block continues at the end of a finally handler if it ends with `endfinally`
    /// itself, or if its single successor starts with one.
    fn flows_into_endfinally(&self, block: &BasicBlock) -> Result<bool> {
        if block.ends_with_endfinally && block.has_seq_points() {
            return Ok(true);
        }

        match block.successors.as_slice() {
            [succ] => Ok(Self::block_of(self.cfg, *succ)?.begins_with_endfinally),
            _ => Ok(false),
        }
    }

    /// Where `endfinally` returns to is not part of the CFG, so the last point of the
    /// handler is linked to the last point of every other block.
    fn link_endfinally(&mut self, block: &BasicBlock) -> Result<()> {
        let Some((source, source_point)) = self.last_live_point(block)? else {
            return Ok(());
        };
        if source_point.is_marker() {
            return Ok(());
        }

        let cfg = self.cfg;
        for other in cfg.blocks() {
            if other.id == block.id {
                continue;
            }

            if let Some((target, _)) = self.last_live_point(other)? {
                self.link(source, target);
            }
        }

        Ok(())
    }

    /// The point a block is left through: its recorded last point, or the last point
    /// before it when code generation dropped the recorded one.
    fn exit_point(&self, block: &BasicBlock) -> Result<Option<(PointId, SequencePoint)>> {
        let Some(last_inst) = block.last_seq_point else {
            return Ok(None);
        };

        let (id, point) = self.resolve(last_inst)?;
        if point.is_dead_code() {
            return self.last_live_point(block);
        }
        Ok(Some((id, point)))
    }

    fn last_live_point(&self, block: &BasicBlock) -> Result<Option<(PointId, SequencePoint)>> {
        for &inst in block.seq_points.iter().rev() {
            let (id, point) = self.resolve(inst)?;
            if !point.is_dead_code() {
                return Ok(Some((id, point)));
            }
        }
        Ok(None)
    }

    /// Inserts `from -> to` unless `to` is a marker or dead code.
    fn link(&mut self, from: PointId, to: PointId) {
        let Some(target) = self.table.get(to) else {
            return;
        };
        if target.is_steppable() {
            self.map.insert(from, to);
        }
    }

    fn resolve(&self, inst: InstId) -> Result<(PointId, SequencePoint)> {
        let id = self.table.id_of(inst).ok_or_else(|| {
            GraphError(format!("Instruction {inst} has no collected sequence point"))
        })?;

        match self.table.get(id) {
            Some(point) => Ok((id, *point)),
            None => Err(GraphError(format!("Sequence point {id} is not in the table"))),
        }
    }

    fn block_of(cfg: &MethodCfg, id: BlockId) -> Result<&BasicBlock> {
        cfg.block(id).ok_or_else(|| {
            GraphError(format!(
                "Block {id} does not exist, graph has {} blocks",
                cfg.block_count()
            ))
        })
    }
}

/// Computes the step-over successors of every point in `table`.
///
/// # Errors
/// Returns [`crate::Error::GraphError`] if `cfg` references instructions or blocks that do
/// not exist.
pub fn build_successor_map(cfg: &MethodCfg, table: &PointTable) -> Result<SuccessorMap> {
    SuccessorGraphBuilder::new(cfg, table).build()
}
