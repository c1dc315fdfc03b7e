mod factories;

pub use factories::*;
