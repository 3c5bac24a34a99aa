//! Core types for parley.

mod resolution;
mod rule;

pub use resolution::*;
pub use rule::*;
