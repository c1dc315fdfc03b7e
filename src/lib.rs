// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a side file into memory

//! # seqpoints
//!
//! Sequence-point tables for a JIT compiler back end. After a method has been compiled,
//! `seqpoints` maps the IL offsets of the method to the native offsets the code generator
//! produced for them, and - with a debugger attached - records for every point the points
//! a single step can land on next.
//!
//! ## Features
//!
//! - **Compact blobs** - Delta and zig-zag encoded tables, validated once when they enter the process
//! - **Step-over data** - Successor sets computed over arbitrary control flow, including loops and finally handlers
//! - **Concurrent registry** - Per-domain, first-writer-wins cache with generic-sharing fallbacks
//! - **AOT side files** - `.msym` containers, memory-mapped when loaded
//!
//! ### Using the Prelude
//!
//! ```rust
//! use seqpoints::prelude::*;
//!
//! let domain = Domain::new(1, "app");
//! let mut cfg = MethodCfg::new();
//! let block = cfg.add_block();
//! cfg.push_seq_point(block, InstId(0))?;
//! cfg.push_seq_point(block, InstId(1))?;
//!
//! let mut unit = CompileUnit::new(
//!     MethodKey::new(Token::method_def(1)),
//!     cfg,
//!     SeqPointConfig::debugger(),
//! );
//! unit.seq_points = vec![
//!     SeqPointInst::new(InstId(0), SequencePoint::new(0, 0x00)),
//!     SeqPointInst::new(InstId(1), SequencePoint::new(4, 0x0c)),
//! ];
//! save_seq_point_info(&mut unit, &domain)?;
//!
//! let method = MethodKey::new(Token::method_def(1));
//! let hit = find_seq_point(&domain, &method, 0).unwrap();
//! assert_eq!(hit.next_ids(), vec![PointId(1)]);
//! # Ok::<(), seqpoints::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`seqpoints`] - Point table, successor builder, encoder, blob and the save pass
//! - [`runtime`] - Domains, their registries and the query API
//! - [`analysis`] - The control-flow graph the pass consumes
//! - [`metadata`] - Method identities and generic-sharing resolution
//!
//! ### Fuzzing
//!
//! ```bash
//! cargo +nightly fuzz run seqpoints --release
//! ```
#[macro_use]
pub(crate) mod error;
pub(crate) mod file;
pub(crate) mod utils;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// Control-flow graph input of the sequence-point pass
///
/// The JIT builds the graph; this crate only reads blocks in layout order, their
/// predecessor and successor lists, their sequence-point instructions, and whether they
/// border an `endfinally`.
pub mod analysis;

/// Method identities used as registry keys
pub mod metadata;

/// Settings of one compilation
pub mod config;

/// Sequence-point tables: building, encoding, decoding and persisting
pub mod seqpoints;

/// Domains, registries and queries
pub mod runtime;

/// `seqpoints` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `seqpoints` Error type
///
/// Decoding failures carry the source location where they were detected, see the
/// individual variants.
pub use error::Error;

/// Bounds-checked cursor used to decode blobs and side files.
pub use file::parser::Parser;

/// Per-compilation settings of the sequence-point pass.
pub use config::SeqPointConfig;
