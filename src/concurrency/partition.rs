//! Splitting the node id range into per-task partitions
//!
//! Uniform partitioning balances node counts. Degree partitioning balances
//! relationship counts, which is what traversal cost follows on power-law
//! graphs:
//!
//! ```text
//! degrees:   [90, 1, 1, 1, 1, 1, 1, 1, 1, 2]     R = 100, concurrency = 2
//! uniform:   [0..5) = 94 rels   [5..10) = 6 rels
//! degree:    [0..1) = 90 rels   [1..10) = 10 rels  (target 50 per task)
//! ```
//!
//! Every function returns disjoint, sorted partitions whose union is exactly
//! `[0, node_count)`, and no partition is empty.

use crate::config::Concurrency;
use crate::error::{ComputeError, ComputeResult};
use crate::storage::Graph;
use std::ops::Range;

/// Metric a partition was sized by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMetric {
    /// Sized by node count
    NodeCount,
    /// Sized by cumulative degree; carries the partition's total
    Degree(u64),
}

/// Contiguous range of node ids owned by one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    start_node: u64,
    node_count: u64,
    metric: PartitionMetric,
}

impl Partition {
    /// Node-count sized partition `[start_node, start_node + node_count)`
    #[must_use]
    pub const fn uniform(start_node: u64, node_count: u64) -> Self {
        Self {
            start_node,
            node_count,
            metric: PartitionMetric::NodeCount,
        }
    }

    /// Degree sized partition with its cumulative degree
    #[must_use]
    pub const fn with_degree(start_node: u64, node_count: u64, total_degree: u64) -> Self {
        Self {
            start_node,
            node_count,
            metric: PartitionMetric::Degree(total_degree),
        }
    }

    /// First node id
    #[must_use]
    pub const fn start_node(&self) -> u64 {
        self.start_node
    }

    /// Number of nodes
    #[must_use]
    pub const fn node_count(&self) -> u64 {
        self.node_count
    }

    /// One past the last node id
    #[must_use]
    pub const fn end_node(&self) -> u64 {
        self.start_node + self.node_count
    }

    /// Metric used to size this partition
    #[must_use]
    pub const fn metric(&self) -> PartitionMetric {
        self.metric
    }

    /// Node ids in this partition
    #[must_use]
    pub const fn nodes(&self) -> Range<u64> {
        self.start_node..self.end_node()
    }
}

/// Split `[0, node_count)` into `min(concurrency, ceil(node_count / min_batch_size))`
/// ranges whose sizes differ by at most one
///
/// A `min_batch_size` of zero is treated as one.
///
/// # Errors
///
/// Returns `InvalidArgument` if `concurrency` is zero
///
/// # Example
///
/// ```
/// use trueno_compute::uniform_partition;
///
/// let partitions = uniform_partition(10, 3, 1).unwrap();
/// let sizes: Vec<_> = partitions.iter().map(|p| p.node_count()).collect();
/// assert_eq!(sizes, vec![4, 3, 3]);
/// ```
pub fn uniform_partition(
    node_count: u64,
    concurrency: usize,
    min_batch_size: u64,
) -> ComputeResult<Vec<Partition>> {
    let concurrency = Concurrency::new(concurrency)?;
    if node_count == 0 {
        return Ok(Vec::new());
    }

    let batches = node_count.div_ceil(min_batch_size.max(1));
    let partition_count = batches.min(concurrency.value() as u64);
    let base = node_count / partition_count;
    let remainder = node_count % partition_count;

    let mut partitions = Vec::with_capacity(partition_count as usize);
    let mut start = 0;
    for index in 0..partition_count {
        let size = base + u64::from(index < remainder);
        partitions.push(Partition::uniform(start, size));
        start += size;
    }
    Ok(partitions)
}

/// Split `[0, node_count)` into consecutive ranges of `batch_size` nodes;
/// the last range holds the remainder
///
/// # Errors
///
/// Returns `InvalidArgument` if `batch_size` is zero
pub fn range_partition_with_batch_size(
    node_count: u64,
    batch_size: u64,
) -> ComputeResult<Vec<Partition>> {
    if batch_size == 0 {
        return Err(ComputeError::invalid("batch size must be positive"));
    }
    Ok((0..node_count)
        .step_by(usize::try_from(batch_size).unwrap_or(usize::MAX))
        .map(|start| Partition::uniform(start, batch_size.min(node_count - start)))
        .collect())
}

/// Split into at most `concurrency` ranges whose start nodes are multiples
/// of `alignment`
///
/// Useful when tasks write into word-packed structures such as bit sets.
///
/// # Errors
///
/// Returns `InvalidArgument` if `concurrency` or `alignment` is zero
pub fn aligned_partition(
    node_count: u64,
    concurrency: usize,
    alignment: u64,
) -> ComputeResult<Vec<Partition>> {
    let concurrency = Concurrency::new(concurrency)?;
    if alignment == 0 {
        return Err(ComputeError::invalid("alignment must be positive"));
    }
    let per_task = node_count.div_ceil(concurrency.value() as u64);
    let batch_size = per_task.div_ceil(alignment).max(1) * alignment;
    range_partition_with_batch_size(node_count, batch_size)
}

/// Split the graph's node range so every partition carries a comparable
/// share of relationships
///
/// Nodes are visited in id order; a partition is closed before the node
/// whose degree would push it past `ceil(relationship_count / concurrency)`,
/// provided it already holds `min_batch_size` nodes. No partition exceeds
/// the target by more than one node's degree. Graphs without relationships
/// fall back to [`uniform_partition`].
///
/// # Errors
///
/// Returns `InvalidArgument` if `concurrency` is zero
pub fn degree_partition<G: Graph>(
    graph: &G,
    concurrency: usize,
    min_batch_size: u64,
) -> ComputeResult<Vec<Partition>> {
    let checked = Concurrency::new(concurrency)?;
    let node_count = graph.node_count();
    let relationship_count = graph.relationship_count();
    if node_count == 0 {
        return Ok(Vec::new());
    }
    if relationship_count == 0 {
        return uniform_partition(node_count, concurrency, min_batch_size);
    }

    let target = relationship_count.div_ceil(checked.value() as u64).max(1);
    let min_batch_size = min_batch_size.max(1);

    let mut partitions = Vec::with_capacity(checked.value());
    let mut start = 0;
    let mut accumulated = 0;
    for node in 0..node_count {
        let degree = graph.degree(node);
        let size = node - start;
        if size >= min_batch_size && accumulated + degree > target {
            partitions.push(Partition::with_degree(start, size, accumulated));
            start = node;
            accumulated = 0;
        }
        accumulated += degree;
    }
    partitions.push(Partition::with_degree(
        start,
        node_count - start,
        accumulated,
    ));

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CsrGraph;

    fn assert_covers(partitions: &[Partition], node_count: u64) {
        let mut expected_start = 0;
        for partition in partitions {
            assert_eq!(partition.start_node(), expected_start);
            assert!(partition.node_count() > 0);
            expected_start = partition.end_node();
        }
        assert_eq!(expected_start, node_count);
    }

    #[test]
    fn test_uniform_nearly_equal() {
        let partitions = uniform_partition(10, 3, 1).unwrap();
        assert_covers(&partitions, 10);
        let sizes: Vec<_> = partitions.iter().map(Partition::node_count).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(partitions[0].metric(), PartitionMetric::NodeCount);
    }

    #[test]
    fn test_uniform_respects_min_batch() {
        // ceil(100 / 40) = 3 batches even with 8 workers
        let partitions = uniform_partition(100, 8, 40).unwrap();
        assert_eq!(partitions.len(), 3);
        assert_covers(&partitions, 100);
    }

    #[test]
    fn test_uniform_more_workers_than_nodes() {
        let partitions = uniform_partition(3, 16, 1).unwrap();
        assert_eq!(partitions.len(), 3);
        assert_covers(&partitions, 3);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(uniform_partition(0, 4, 1).unwrap().is_empty());
        assert!(matches!(
            uniform_partition(10, 0, 1),
            Err(ComputeError::InvalidArgument(_))
        ));
        assert!(range_partition_with_batch_size(10, 0).is_err());
        assert!(aligned_partition(10, 2, 0).is_err());
    }

    #[test]
    fn test_range_partition() {
        let partitions = range_partition_with_batch_size(10, 4).unwrap();
        assert_eq!(
            partitions.iter().map(Partition::nodes).collect::<Vec<_>>(),
            vec![0..4, 4..8, 8..10]
        );
    }

    #[test]
    fn test_aligned_partition() {
        let partitions = aligned_partition(1_000, 3, 64).unwrap();
        assert_covers(&partitions, 1_000);
        assert!(partitions.iter().all(|p| p.start_node() % 64 == 0));
        assert_eq!(partitions.len(), 3);
    }

    #[test]
    fn test_degree_partition_isolates_hub() {
        let mut edges = Vec::new();
        for target in 1..=90 {
            edges.push((0, target % 10, 1.0));
        }
        for source in 1..10 {
            edges.push((source, 0, 1.0));
        }
        edges.push((9, 1, 1.0));
        let graph = CsrGraph::with_node_count(10, &edges).unwrap();

        let partitions = degree_partition(&graph, 2, 1).unwrap();
        assert_covers(&partitions, 10);
        assert_eq!(partitions[0].nodes(), 0..1);
        assert_eq!(partitions[0].metric(), PartitionMetric::Degree(90));
        assert_eq!(partitions[1].metric(), PartitionMetric::Degree(10));
    }

    #[test]
    fn test_degree_partition_without_relationships() {
        let graph = CsrGraph::with_node_count(8, &[]).unwrap();
        let partitions = degree_partition(&graph, 4, 1).unwrap();
        assert_eq!(partitions.len(), 4);
        assert_covers(&partitions, 8);
    }

    #[test]
    fn test_degree_partition_keeps_min_batch() {
        let edges: Vec<_> = (0..20).map(|n| (n, (n + 1) % 20, 1.0)).collect();
        let graph = CsrGraph::with_node_count(20, &edges).unwrap();
        let partitions = degree_partition(&graph, 10, 5).unwrap();
        assert_covers(&partitions, 20);
        assert!(partitions.iter().all(|p| p.node_count() >= 5));
    }
}
