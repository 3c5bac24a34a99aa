//! Core traits for parley collaborators.

mod embedder;

pub use embedder::*;
