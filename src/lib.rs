//! trueno-compute: partitioned graph compute substrate
//!
//! # Overview
//!
//! trueno-compute provides the building blocks parallel graph algorithms run
//! on: paged arrays addressed by 64-bit ids, atomic accumulators, degree-aware
//! work partitioning, a bounded-concurrency executor with cooperative
//! cancellation, and the priority queues used by greedy and shortest-path
//! searches.
//!
//! # Quick Start
//!
//! ```
//! use trueno_compute::{degree_centrality, CsrGraph, DegreeCentralityConfig, Orientation};
//!
//! // 4-cycle: 0 → 1 → 2 → 3 → 0
//! let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)])?;
//!
//! let config = DegreeCentralityConfig {
//!     orientation: "undirected".parse()?,
//!     concurrency: 2,
//!     ..DegreeCentralityConfig::default()
//! };
//! let degrees = degree_centrality(&graph, &config)?;
//! assert_eq!(degrees.to_vec(), vec![2.0; 4]);
//!
//! // Highest-degree nodes, ties by lower id
//! assert_eq!(degrees.top_k(1)?, vec![(0, 2.0)]);
//! # assert_eq!(config.orientation, Orientation::Undirected);
//! # Ok::<(), trueno_compute::Error>(())
//! ```
//!
//! # Architecture
//!
//! - **Collections**: `HugeArray`, atomic arrays, `HugeBitSet`, bounded and
//!   huge priority queues, all paged (see [`collections`])
//! - **Concurrency**: partitioners, `RunWithConcurrency`, termination flags
//!   (see [`concurrency`])
//! - **Storage**: the [`Graph`] view and its CSR implementation
//! - **Algorithms**: degree centrality and Dijkstra as consumers of the above

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithms;
pub mod collections;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod progress;
pub mod storage;

// Re-export core types
pub use algorithms::{
    degree_centrality, dijkstra, dijkstra_path, dijkstra_with_termination, DegreeCentrality,
    DegreeCentralityConfig, Degrees, NonPositiveWeights,
};
pub use collections::{
    BoundedPriorityQueue, CostOrder, HugeArray, HugeAtomicDoubleArray, HugeAtomicLongArray,
    HugeBitSet, HugeDoubleArray, HugeLongArray, HugeMaxPriorityQueue, HugeMinPriorityQueue,
    HugePriorityQueue, MaxOrder, MinOrder, PageLayout, PartitionWriter, Retain,
};
pub use concurrency::{
    aligned_partition, build_pool, degree_partition, range_partition_with_batch_size,
    uniform_partition, AlwaysRunning, ExecutorState, Partition, PartitionMetric,
    RunWithConcurrency, TerminationFlag, TerminationSignal,
};
pub use config::{Concurrency, DEFAULT_CONCURRENCY, DEFAULT_MIN_BATCH_SIZE, PAGE_SHIFT};
pub use error::{ComputeError, ComputeResult};
pub use progress::{EmptyProgressTracker, ProgressTracker, TaskProgressTracker};
pub use storage::{CsrGraph, Graph, NodeId, Orientation};

// Error type
pub use anyhow::{Error, Result};
