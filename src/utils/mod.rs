//! Shared helpers used across the crate.

mod encoding;

pub use encoding::{
    encoded_int_size, write_7bit_encoded_int, write_zigzag_int, zigzag_decode, zigzag_encode,
};
