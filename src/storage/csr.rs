//! CSR (Compressed Sparse Row) graph on paged arrays
//!
//! # CSR Format
//!
//! ```text
//! Graph: 0 → 1, 0 → 2, 1 → 2
//!
//! forward:  offsets [0, 2, 3, 3]   targets [1, 2, 2]
//! reverse:  offsets [0, 0, 1, 3]   targets [0, 0, 1]
//! ```
//!
//! Offsets, targets and weights live in [`HugeArray`]s, so neither the node
//! count nor the relationship count is bounded by a single allocation. Both
//! adjacencies are built once by a stable counting sort: relationships of
//! one node keep their input order.

use crate::collections::{HugeArray, HugeDoubleArray};
use crate::error::ComputeError;
use crate::storage::graph::{Graph, Orientation};
use anyhow::Result;
use std::ops::Range;
use std::sync::Arc;

/// One direction of adjacency
#[derive(Debug)]
struct Adjacency {
    /// node i's relationships occupy `offsets[i]..offsets[i + 1]`
    offsets: HugeArray<u64>,
    targets: HugeArray<u64>,
    weights: Option<HugeDoubleArray>,
}

impl Adjacency {
    fn build(
        node_count: u64,
        relationships: &[(u64, u64, f64)],
        weighted: bool,
        endpoints: impl Fn(&(u64, u64, f64)) -> (u64, u64),
    ) -> Self {
        let relationship_count = relationships.len() as u64;

        let mut offsets = HugeArray::<u64>::new(node_count + 1);
        for relationship in relationships {
            let (source, _) = endpoints(relationship);
            offsets[source + 1] += 1;
        }
        for node in 0..node_count {
            let start = offsets[node];
            offsets[node + 1] += start;
        }

        let mut cursor = offsets.clone();
        let mut targets = HugeArray::new(relationship_count);
        let mut weights = weighted.then(|| HugeDoubleArray::new(relationship_count));
        for relationship in relationships {
            let (source, target) = endpoints(relationship);
            let slot = cursor[source];
            cursor[source] += 1;
            targets[slot] = target;
            if let Some(weights) = weights.as_mut() {
                weights[slot] = relationship.2;
            }
        }

        Self {
            offsets,
            targets,
            weights,
        }
    }

    fn range(&self, node: u64) -> Range<u64> {
        if node >= self.offsets.len() - 1 {
            return 0..0;
        }
        self.offsets[node]..self.offsets[node + 1]
    }

    fn for_each(&self, node: u64, consumer: &mut dyn FnMut(u64, u64) -> bool) -> bool {
        self.range(node).all(|slot| consumer(node, self.targets[slot]))
    }

    fn neighbors(&self, node: u64) -> Vec<u64> {
        self.range(node).map(|slot| self.targets[slot]).collect()
    }
}

#[derive(Debug)]
struct CsrStorage {
    node_count: u64,
    forward: Adjacency,
    reverse: Adjacency,
}

/// Node identifier (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u64 {
    fn from(node: NodeId) -> Self {
        node.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable CSR graph with forward and reverse adjacency
///
/// Cloning shares the underlying storage, so [`Graph::concurrent_copy`] is
/// a reference count increment.
///
/// # Example
///
/// ```
/// use trueno_compute::{CsrGraph, NodeId};
///
/// let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (0, 2, 1.0), (1, 2, 1.0)]).unwrap();
///
/// assert_eq!(graph.outgoing_neighbors(NodeId(0)).unwrap(), vec![1, 2]);
/// assert_eq!(graph.incoming_neighbors(NodeId(2)).unwrap(), vec![0, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct CsrGraph {
    storage: Arc<CsrStorage>,
}

impl CsrGraph {
    /// Create graph from a weighted edge list
    ///
    /// The node count is one past the largest id mentioned.
    ///
    /// # Errors
    ///
    /// Returns error if an id is `u64::MAX`, which leaves no room for the count
    pub fn from_edge_list(edges: &[(u64, u64, f64)]) -> Result<Self> {
        let node_count = inferred_node_count(edges.iter().flat_map(|&(s, t, _)| [s, t]))?;
        Self::build(node_count, edges, true)
    }

    /// Create graph from an edge list without a weight property
    ///
    /// # Errors
    ///
    /// Same as [`CsrGraph::from_edge_list`]
    pub fn from_unweighted_edges(edges: &[(u64, u64)]) -> Result<Self> {
        let node_count = inferred_node_count(edges.iter().flat_map(|&(s, t)| [s, t]))?;
        let edges: Vec<_> = edges.iter().map(|&(s, t)| (s, t, 1.0)).collect();
        Self::build(node_count, &edges, false)
    }

    /// Create graph with exactly `node_count` nodes, isolated ones included
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a relationship references a node
    /// outside `[0, node_count)`
    pub fn with_node_count(node_count: u64, edges: &[(u64, u64, f64)]) -> Result<Self> {
        Self::build(node_count, edges, true)
    }

    fn build(node_count: u64, edges: &[(u64, u64, f64)], weighted: bool) -> Result<Self> {
        if node_count == u64::MAX {
            return Err(ComputeError::invalid("node count must leave room for offsets").into());
        }
        if let Some(&(source, target, _)) = edges
            .iter()
            .find(|&&(s, t, _)| s >= node_count || t >= node_count)
        {
            return Err(ComputeError::invalid(format!(
                "relationship ({source}, {target}) references a node outside [0, {node_count})"
            ))
            .into());
        }

        let forward = Adjacency::build(node_count, edges, weighted, |&(s, t, _)| (s, t));
        // weighted iteration only follows stored direction
        let reverse = Adjacency::build(node_count, edges, false, |&(s, t, _)| (t, s));
        Ok(Self {
            storage: Arc::new(CsrStorage {
                node_count,
                forward,
                reverse,
            }),
        })
    }

    /// Get outgoing neighbors of a node, in input order
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the node id is out of bounds
    pub fn outgoing_neighbors(&self, node: NodeId) -> Result<Vec<u64>> {
        self.check_node(node.0)?;
        Ok(self.storage.forward.neighbors(node.0))
    }

    /// Get incoming neighbors of a node via the reverse adjacency
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the node id is out of bounds
    pub fn incoming_neighbors(&self, target: NodeId) -> Result<Vec<u64>> {
        self.check_node(target.0)?;
        Ok(self.storage.reverse.neighbors(target.0))
    }

    /// Number of incoming relationships of `node`
    #[must_use]
    pub fn in_degree(&self, node: u64) -> u64 {
        let range = self.storage.reverse.range(node);
        range.end - range.start
    }

    /// Get number of nodes
    #[must_use]
    pub fn num_nodes(&self) -> u64 {
        self.storage.node_count
    }

    /// Get number of edges
    #[must_use]
    pub fn num_edges(&self) -> u64 {
        self.storage.forward.targets.len()
    }

    fn check_node(&self, node: u64) -> Result<(), ComputeError> {
        if node < self.storage.node_count {
            Ok(())
        } else {
            Err(ComputeError::out_of_bounds(node, self.storage.node_count))
        }
    }
}

fn inferred_node_count(ids: impl Iterator<Item = u64>) -> Result<u64, ComputeError> {
    ids.max().map_or(Ok(0), |max_node| {
        max_node
            .checked_add(1)
            .ok_or_else(|| ComputeError::invalid("node id u64::MAX is reserved"))
    })
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self {
            storage: Arc::new(CsrStorage {
                node_count: 0,
                forward: Adjacency::build(0, &[], false, |&(s, t, _)| (s, t)),
                reverse: Adjacency::build(0, &[], false, |&(s, t, _)| (t, s)),
            }),
        }
    }
}

impl Graph for CsrGraph {
    fn node_count(&self) -> u64 {
        self.storage.node_count
    }

    fn relationship_count(&self) -> u64 {
        self.num_edges()
    }

    fn degree(&self, node: u64) -> u64 {
        let range = self.storage.forward.range(node);
        range.end - range.start
    }

    fn has_relationship_property(&self) -> bool {
        self.storage.forward.weights.is_some()
    }

    fn for_each_relationship(
        &self,
        node: u64,
        orientation: Orientation,
        consumer: &mut dyn FnMut(u64, u64) -> bool,
    ) {
        match orientation {
            Orientation::Natural => {
                self.storage.forward.for_each(node, consumer);
            }
            Orientation::Reverse => {
                self.storage.reverse.for_each(node, consumer);
            }
            Orientation::Undirected => {
                if self.storage.forward.for_each(node, consumer) {
                    self.storage.reverse.for_each(node, consumer);
                }
            }
        }
    }

    fn for_each_weighted_relationship(
        &self,
        node: u64,
        fallback_weight: f64,
        consumer: &mut dyn FnMut(u64, u64, f64) -> bool,
    ) {
        let forward = &self.storage.forward;
        for slot in forward.range(node) {
            let weight = forward
                .weights
                .as_ref()
                .map_or(fallback_weight, |weights| weights[slot]);
            if !consumer(node, forward.targets[slot], weight) {
                return;
            }
        }
    }

    fn concurrent_copy(&self) -> Self {
        self.clone()
    }
}
