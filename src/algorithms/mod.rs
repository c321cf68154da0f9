//! Graph algorithms built on the partitioned substrate
//!
//! - [`degree`]: orientation-aware degree centrality (parallel aggregation)
//! - [`shortest_path`]: Dijkstra on the huge priority queue

pub mod degree;
pub mod shortest_path;

pub use degree::{
    degree_centrality, DegreeCentrality, DegreeCentralityConfig, Degrees, NonPositiveWeights,
};
pub use shortest_path::{dijkstra, dijkstra_path, dijkstra_with_termination};
