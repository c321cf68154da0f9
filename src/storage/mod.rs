//! Graph storage layer
//!
//! Provides the [`Graph`] view consumed by algorithms and its immutable CSR
//! (Compressed Sparse Row) implementation.

pub mod csr;
pub mod graph;

pub use csr::{CsrGraph, NodeId};
pub use graph::{Graph, Orientation};
