//! Binary input for sequence-point blobs and side files.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor over a byte slice
//! - [`crate::file::physical::Physical`] - Memory-mapped, read-only file access

pub mod parser;
pub mod physical;

pub use physical::Physical;
