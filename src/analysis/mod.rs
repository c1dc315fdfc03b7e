//! Program analysis inputs.
//!
//! - [`cfg`] - Control-flow graph consumed by the successor graph builder

pub mod cfg;

pub use cfg::{BasicBlock, BlockId, InstId, MethodCfg};
