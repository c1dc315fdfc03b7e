//! Control-flow graph input of the sequence-point pass.
//!
//! Graph construction belongs to the compiler; this module only defines the shape in
//! which the pass consumes it:
//!
//! - [`MethodCfg`] - Blocks of one method in layout order
//! - [`BasicBlock`] - Sequence-point instructions, edges and `endfinally` adjacency of a block
//! - [`BlockId`] / [`InstId`] - Block and instruction identities

mod block;
mod graph;

pub use block::{BasicBlock, BlockId, InstId};
pub use graph::MethodCfg;
