//! Partitioning, bounded execution and cooperative cancellation

pub mod executor;
pub mod partition;
pub mod termination;

pub use executor::{build_pool, ExecutorState, RunWithConcurrency};
pub use partition::{
    aligned_partition, degree_partition, range_partition_with_batch_size, uniform_partition,
    Partition, PartitionMetric,
};
pub use termination::{AlwaysRunning, TerminationFlag, TerminationSignal};
