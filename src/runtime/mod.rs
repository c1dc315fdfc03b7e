//! Runtime-side state: domains, their sequence-point registries and the query API.
//!
//! A [`Domain`] owns one [`SeqPointRegistry`]. Compiler threads register blobs into it
//! through [`crate::seqpoints::save_seq_point_info`]; debugger threads read them back with
//! the functions in [`query`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use seqpoints::{
//!     metadata::{MethodKey, Token},
//!     runtime::{query, Domain},
//!     seqpoints::{SeqPointInfoBuilder, SequencePoint},
//! };
//!
//! let domain = Domain::new(1, "app");
//! let method = MethodKey::new(Token::method_def(1));
//!
//! let mut builder = SeqPointInfoBuilder::new(false);
//! builder.add_seq_point(&SequencePoint::new(0, 0x10), &[]);
//! builder.add_seq_point(&SequencePoint::new(6, 0x24), &[]);
//! domain.register_seq_points(method.clone(), Arc::new(builder.finish()));
//!
//! let hit = query::find_prev_seq_point_for_native_offset(&domain, &method, 0x20).unwrap();
//! assert_eq!(hit.point().il_offset, 0);
//! ```

mod domain;
pub mod query;
mod registry;

pub use domain::{Domain, DomainStats};
pub use query::SeqPointHit;
pub use registry::SeqPointRegistry;
