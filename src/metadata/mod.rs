//! Method identity used to key sequence-point tables.
//!
//! - [`token`] - Metadata tokens
//! - [`method`] - Compiled-method keys and generic-sharing resolution

pub mod method;
pub mod token;

pub use method::{FullSharing, GenericSharing, Instantiation, MethodKey, TypeArg};
pub use token::Token;
