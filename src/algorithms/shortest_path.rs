//! Shortest path algorithms: Dijkstra's algorithm on the huge priority queue
//!
//! Provides shortest path computation for weighted graphs:
//! - `dijkstra`: Single-source shortest paths with non-negative weights
//! - `dijkstra_path`: Shortest path between two specific nodes
//!
//! Tentative distances live in a [`HugeMinPriorityQueue`] keyed by node id;
//! a shorter path found for a queued node repositions it through `set`.
//! Relationships without a weight property count as `1.0`.
//!
//! # Example
//!
//! ```
//! use trueno_compute::{dijkstra, CsrGraph};
//!
//! let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (1, 2, 2.0), (0, 2, 5.0)]).unwrap();
//!
//! let distances = dijkstra(&graph, 0).unwrap();
//! assert_eq!(distances.to_vec(), vec![0.0, 1.0, 3.0]); // 0→1→2 = 3.0, not 0→2 = 5.0
//! ```

use crate::collections::{HugeArray, HugeBitSet, HugeDoubleArray, HugeMinPriorityQueue};
use crate::concurrency::{AlwaysRunning, TerminationSignal};
use crate::error::{ComputeError, ComputeResult};
use crate::storage::Graph;
use anyhow::Result;
use tracing::debug;

/// Marks nodes without a predecessor on the current shortest path tree
const NO_PREDECESSOR: u64 = u64::MAX;

const DEFAULT_WEIGHT: f64 = 1.0;

struct SearchState {
    distances: HugeDoubleArray,
    predecessors: HugeArray<u64>,
    settled: HugeBitSet,
    queue: HugeMinPriorityQueue,
}

impl SearchState {
    fn relax(&mut self, from: u64, cost: f64, to: u64, weight: f64) -> ComputeResult<()> {
        if self.settled.get(to)? {
            return Ok(());
        }
        let next_cost = cost + weight;
        if next_cost < self.distances.get(to)? {
            self.distances.set(to, next_cost)?;
            self.predecessors.set(to, from)?;
            self.queue.set(to, next_cost)?;
        }
        Ok(())
    }
}

fn search<G: Graph>(
    graph: &G,
    source: u64,
    target: Option<u64>,
    termination: &dyn TerminationSignal,
) -> Result<SearchState> {
    let node_count = graph.node_count();
    for node in std::iter::once(source).chain(target) {
        if node >= node_count {
            return Err(ComputeError::out_of_bounds(node, node_count).into());
        }
    }

    let mut state = SearchState {
        distances: HugeDoubleArray::new(node_count),
        predecessors: HugeArray::new(node_count),
        settled: HugeBitSet::new(node_count),
        queue: HugeMinPriorityQueue::new(node_count)?,
    };
    state.distances.fill(f64::INFINITY);
    state.predecessors.fill(NO_PREDECESSOR);
    state.distances.set(source, 0.0)?;
    state.queue.add(source, 0.0)?;

    let mut settled_count = 0_u64;
    while let Some((node, cost)) = state.queue.pop_with_cost() {
        termination.assert_running()?;
        state.settled.set(node)?;
        settled_count += 1;
        if target == Some(node) {
            break;
        }

        let mut outcome = Ok(());
        graph.for_each_weighted_relationship(node, DEFAULT_WEIGHT, &mut |_, neighbor, weight| {
            outcome = state.relax(node, cost, neighbor, weight);
            outcome.is_ok()
        });
        outcome?;
    }

    debug!(source, settled = settled_count, "shortest path search finished");
    Ok(state)
}

/// Compute single-source shortest paths using Dijkstra's algorithm
///
/// Edge weights are used as distances and must be non-negative.
///
/// # Returns
///
/// One distance per node; unreachable nodes hold `f64::INFINITY`.
///
/// # Complexity
///
/// O((V + E) log V) heap operations, plus a linear scan per decrease-key
///
/// # Errors
///
/// Returns `IndexOutOfBounds` if `source` is not a node of `graph`
///
/// # Example
///
/// ```
/// use trueno_compute::{dijkstra, CsrGraph};
///
/// let graph = CsrGraph::from_edge_list(&[(0, 1, 4.0), (0, 2, 1.0), (2, 1, 2.0)]).unwrap();
///
/// let distances = dijkstra(&graph, 0).unwrap();
/// // Shortest to node 1: 0→2→1 = 3.0 (not 0→1 = 4.0)
/// assert_eq!(distances.get(1).unwrap(), 3.0);
/// ```
pub fn dijkstra<G: Graph>(graph: &G, source: u64) -> Result<HugeDoubleArray> {
    dijkstra_with_termination(graph, source, &AlwaysRunning)
}

/// [`dijkstra`] polling `termination` once per settled node
///
/// # Errors
///
/// Returns `IndexOutOfBounds` for an unknown `source` and `Cancelled` once
/// `termination` stops the search
pub fn dijkstra_with_termination<G: Graph>(
    graph: &G,
    source: u64,
    termination: &dyn TerminationSignal,
) -> Result<HugeDoubleArray> {
    Ok(search(graph, source, None, termination)?.distances)
}

/// Find the shortest path between two nodes
///
/// The search stops as soon as `target` is settled.
///
/// # Returns
///
/// * `Some((distance, path))` if a path exists, `path` running from
///   `source` to `target`
/// * `None` if target is unreachable from source
///
/// # Errors
///
/// Returns `IndexOutOfBounds` if either node is not part of `graph`
///
/// # Example
///
/// ```
/// use trueno_compute::{dijkstra_path, CsrGraph};
///
/// let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (1, 2, 2.0)]).unwrap();
///
/// let (dist, path) = dijkstra_path(&graph, 0, 2).unwrap().unwrap();
/// assert_eq!(dist, 3.0);
/// assert_eq!(path, vec![0, 1, 2]);
/// ```
pub fn dijkstra_path<G: Graph>(
    graph: &G,
    source: u64,
    target: u64,
) -> Result<Option<(f64, Vec<u64>)>> {
    let state = search(graph, source, Some(target), &AlwaysRunning)?;
    let distance = state.distances.get(target)?;
    if distance.is_infinite() {
        return Ok(None);
    }

    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = state.predecessors.get(current)?;
        if current == NO_PREDECESSOR {
            return Ok(None);
        }
        path.push(current);
    }
    path.reverse();
    Ok(Some((distance, path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::TerminationFlag;
    use crate::storage::CsrGraph;

    #[test]
    fn test_single_node_graph() {
        let graph = CsrGraph::with_node_count(1, &[]).unwrap();
        assert_eq!(dijkstra(&graph, 0).unwrap().to_vec(), vec![0.0]);
    }

    #[test]
    fn test_chain() {
        // 0 --1.0--> 1 --2.0--> 2
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (1, 2, 2.0)]).unwrap();

        let distances = dijkstra(&graph, 0).unwrap();
        assert_eq!(distances.to_vec(), vec![0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_decrease_key_repositions_queued_node() {
        // 3 is queued at 10.0 first, then improved to 3.0 via 1 and 2
        let graph = CsrGraph::from_edge_list(&[
            (0, 3, 10.0),
            (0, 1, 1.0),
            (1, 2, 1.0),
            (2, 3, 1.0),
            (0, 4, 2.5),
        ])
        .unwrap();

        let distances = dijkstra(&graph, 0).unwrap();
        assert_eq!(distances.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 2.5]);
    }

    #[test]
    fn test_unreachable_node() {
        // 0 → 1, 2 → 3 (disconnected)
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (2, 3, 1.0)]).unwrap();

        let distances = dijkstra(&graph, 0).unwrap();
        assert_eq!(distances.get(1).unwrap(), 1.0);
        assert!(distances.get(2).unwrap().is_infinite());
        assert!(distances.get(3).unwrap().is_infinite());
    }

    #[test]
    fn test_source_out_of_bounds() {
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0)]).unwrap();

        let error = dijkstra(&graph, 100).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ComputeError>(),
            Some(&ComputeError::out_of_bounds(100, 2))
        );
        assert!(dijkstra(&CsrGraph::default(), 0).is_err());
    }

    #[test]
    fn test_zero_weight_edge() {
        let graph = CsrGraph::from_edge_list(&[(0, 1, 0.0), (1, 2, 0.0)]).unwrap();

        let distances = dijkstra(&graph, 0).unwrap();
        assert_eq!(distances.get(2).unwrap(), 0.0);
    }

    #[test]
    fn test_dijkstra_path_chooses_shorter() {
        // 0 --5.0--> 2 (direct)
        // 0 --1.0--> 1 --2.0--> 2 (via 1, total 3.0)
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (1, 2, 2.0), (0, 2, 5.0)]).unwrap();

        let (dist, path) = dijkstra_path(&graph, 0, 2).unwrap().unwrap();
        assert_eq!(dist, 3.0);
        assert_eq!(path, vec![0, 1, 2]);
    }

    #[test]
    fn test_dijkstra_path_same_node() {
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0)]).unwrap();

        let (dist, path) = dijkstra_path(&graph, 0, 0).unwrap().unwrap();
        assert_eq!(dist, 0.0);
        assert_eq!(path, vec![0]);
    }

    #[test]
    fn test_dijkstra_path_unreachable() {
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (2, 3, 1.0)]).unwrap();

        assert!(dijkstra_path(&graph, 0, 3).unwrap().is_none());
        assert!(dijkstra_path(&graph, 0, 9).is_err());
    }

    #[test]
    fn test_diamond_shortest_path() {
        //     1
        //    / \
        //   0   3  (1→3: 1, 2→3: 5)
        //    \ /
        //     2
        let graph = CsrGraph::from_edge_list(&[
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 3, 1.0),
            (2, 3, 5.0),
        ])
        .unwrap();

        let (dist, path) = dijkstra_path(&graph, 0, 3).unwrap().unwrap();
        assert_eq!(dist, 2.0); // 0→1→3
        assert_eq!(path, vec![0, 1, 3]);
    }

    #[test]
    fn test_unweighted_graph_counts_hops() {
        let graph = CsrGraph::from_unweighted_edges(&[(0, 1), (1, 2), (2, 0), (0, 3)]).unwrap();

        let distances = dijkstra(&graph, 0).unwrap();
        assert_eq!(distances.to_vec(), vec![0.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_cancelled_search() {
        let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0)]).unwrap();
        let flag = TerminationFlag::new();
        flag.terminate();

        let error = dijkstra_with_termination(&graph, 0, &flag).unwrap_err();
        assert!(ComputeError::is_cancellation(&error));
    }
}
