//! # seqpoints Prelude
//!
//! Import this module to get quick access to the types needed to run the sequence-point
//! pass and query its results.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all seqpoints operations
pub use crate::Error;

/// The result type used throughout seqpoints
pub use crate::Result;

/// Settings of one compilation
pub use crate::SeqPointConfig;

// ================================================================================================
// Pass Input
// ================================================================================================

/// Control-flow graph consumed by the pass
pub use crate::analysis::{BasicBlock, BlockId, InstId, MethodCfg};

/// Method identities
pub use crate::metadata::{GenericSharing, MethodKey, Token, TypeArg};

// ================================================================================================
// Sequence Points
// ================================================================================================

pub use crate::seqpoints::{
    save_seq_point_info, CompileUnit, PointId, SeqPointData, SeqPointEntry, SeqPointFlags,
    SeqPointInfo, SeqPointInfoBuilder, SeqPointInst, SequencePoint,
};

// ================================================================================================
// Runtime
// ================================================================================================

pub use crate::runtime::{
    query::{
        find_next_seq_point_for_native_offset, find_prev_seq_point_for_native_offset,
        find_seq_point, get_seq_points,
    },
    Domain, SeqPointHit,
};
