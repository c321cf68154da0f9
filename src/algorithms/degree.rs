//! Degree centrality: orientation-aware relationship aggregation
//!
//! Computes one scalar per node from its relationships:
//!
//! ```text
//! orientation   unweighted                      weighted
//! NATURAL       out-degree, read from graph     Σ w over own relationships
//! REVERSE       result[t] += 1 per (s, t)       result[t] += w per (s, t)
//! UNDIRECTED    result[n] += degree(n)          result[n] += Σ w
//!               result[t] += 1 per (n, t)       result[t] += w per (n, t)
//! ```
//!
//! NATURAL weighted writes each slot exactly once, through the partition's
//! exclusive writer. REVERSE and UNDIRECTED land on slots owned by other
//! partitions and accumulate into atomic arrays; the final values do not
//! depend on concurrency because each relationship contributes exactly once.
//!
//! Weights `<= 0` contribute nothing unless the policy says otherwise (see
//! [`NonPositiveWeights`]). Counts are 64-bit and wrap on overflow.

use crate::collections::{
    BoundedPriorityQueue, HugeAtomicDoubleArray, HugeAtomicLongArray, HugeDoubleArray,
};
use crate::concurrency::{
    build_pool, degree_partition, AlwaysRunning, Partition, RunWithConcurrency, TerminationSignal,
};
use crate::config::{Concurrency, DEFAULT_CONCURRENCY, DEFAULT_MIN_BATCH_SIZE};
use crate::error::{ComputeError, ComputeResult};
use crate::progress::{EmptyProgressTracker, ProgressTracker};
use crate::storage::{Graph, Orientation};
use anyhow::Result;
use rayon::ThreadPool;
use tracing::info;

const TASK_NAME: &str = "DegreeCentrality";

/// Weight reported for relationships of graphs without a weight property
const DEFAULT_WEIGHT: f64 = 1.0;

/// Treatment of relationship weights `<= 0` in weighted aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonPositiveWeights {
    /// Contribute `0` (also applies to NaN)
    #[default]
    Ignore,
    /// Contribute the weight as-is
    Keep,
}

impl NonPositiveWeights {
    /// Contribution of one relationship with `weight`
    #[must_use]
    pub fn apply(self, weight: f64) -> f64 {
        match self {
            Self::Ignore if weight > 0.0 => weight,
            Self::Ignore => 0.0,
            Self::Keep => weight,
        }
    }
}

/// Parameters of one degree centrality run
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeCentralityConfig {
    /// Worker count; zero is rejected by [`validate`](Self::validate)
    pub concurrency: usize,
    /// Direction relationships are counted in
    pub orientation: Orientation,
    /// Sum weights instead of counting relationships
    pub weighted: bool,
    /// Minimum nodes per partition
    pub min_batch_size: u64,
    /// Treatment of non-positive weights
    pub non_positive_weights: NonPositiveWeights,
}

impl Default for DegreeCentralityConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            orientation: Orientation::Natural,
            weighted: false,
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            non_positive_weights: NonPositiveWeights::Ignore,
        }
    }
}

impl DegreeCentralityConfig {
    /// Check the configuration before any work is scheduled
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `concurrency` is zero
    pub fn validate(&self) -> ComputeResult<Concurrency> {
        Concurrency::new(self.concurrency)
    }
}

/// Accumulation strategy, resolved once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregation {
    NaturalCount,
    NaturalWeighted,
    ReverseCount,
    ReverseWeighted,
    UndirectedCount,
    UndirectedWeighted,
}

impl Aggregation {
    const fn resolve(orientation: Orientation, weighted: bool) -> Self {
        match (orientation, weighted) {
            (Orientation::Natural, false) => Self::NaturalCount,
            (Orientation::Natural, true) => Self::NaturalWeighted,
            (Orientation::Reverse, false) => Self::ReverseCount,
            (Orientation::Reverse, true) => Self::ReverseWeighted,
            (Orientation::Undirected, false) => Self::UndirectedCount,
            (Orientation::Undirected, true) => Self::UndirectedWeighted,
        }
    }
}

/// Per-node degree centrality result
#[derive(Debug)]
pub enum Degrees<'a, G> {
    /// Unweighted NATURAL degrees, served by the graph itself
    Graph(&'a G),
    /// One value per node, written by exactly one task
    Values(HugeDoubleArray),
    /// Accumulated relationship counts
    Counts(HugeAtomicLongArray),
    /// Accumulated relationship weights
    Weights(HugeAtomicDoubleArray),
}

impl<G: Graph> Degrees<'_, G> {
    /// Number of nodes with a value
    #[must_use]
    pub fn node_count(&self) -> u64 {
        match self {
            Self::Graph(graph) => graph.node_count(),
            Self::Values(values) => values.len(),
            Self::Counts(counts) => counts.len(),
            Self::Weights(weights) => weights.len(),
        }
    }

    /// Degree of `node`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `node >= node_count()`
    #[allow(clippy::cast_precision_loss)] // degrees beyond 2^53 are not expected
    pub fn get(&self, node: u64) -> ComputeResult<f64> {
        match self {
            Self::Graph(graph) => {
                if node >= graph.node_count() {
                    return Err(ComputeError::out_of_bounds(node, graph.node_count()));
                }
                Ok(graph.degree(node) as f64)
            }
            Self::Values(values) => values.get(node),
            Self::Counts(counts) => counts.get(node).map(|count| count as f64),
            Self::Weights(weights) => weights.get(node),
        }
    }

    /// All degrees in node id order
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // degrees beyond 2^53 are not expected
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Graph(graph) => (0..graph.node_count())
                .map(|node| graph.degree(node) as f64)
                .collect(),
            Self::Values(values) => values.to_vec(),
            Self::Counts(counts) => counts.to_vec().into_iter().map(|c| c as f64).collect(),
            Self::Weights(weights) => weights.to_vec(),
        }
    }

    /// The `k` nodes with the highest degree, best first
    ///
    /// Ties keep the node with the lower id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `k` is zero
    pub fn top_k(&self, k: usize) -> ComputeResult<Vec<(u64, f64)>> {
        let mut queue = BoundedPriorityQueue::max(k)?;
        for node in 0..self.node_count() {
            queue.offer(node, self.get(node)?);
        }
        Ok(queue.iter().collect())
    }
}

/// Degree centrality over a [`Graph`] view
///
/// # Example
///
/// ```
/// use trueno_compute::{CsrGraph, DegreeCentrality, DegreeCentralityConfig, Orientation};
///
/// let graph = CsrGraph::from_edge_list(&[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)]).unwrap();
/// let config = DegreeCentralityConfig {
///     orientation: Orientation::Undirected,
///     concurrency: 2,
///     ..DegreeCentralityConfig::default()
/// };
///
/// let degrees = DegreeCentrality::new(&graph, config).compute().unwrap();
/// assert_eq!(degrees.to_vec(), vec![2.0, 2.0, 2.0]);
/// ```
pub struct DegreeCentrality<'a, G> {
    graph: &'a G,
    config: DegreeCentralityConfig,
    pool: Option<&'a ThreadPool>,
    termination: &'a dyn TerminationSignal,
    progress: &'a dyn ProgressTracker,
}

impl<G> std::fmt::Debug for DegreeCentrality<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DegreeCentrality")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a, G: Graph> DegreeCentrality<'a, G> {
    /// Prepare a run over `graph`
    #[must_use]
    pub fn new(graph: &'a G, config: DegreeCentralityConfig) -> Self {
        Self {
            graph,
            config,
            pool: None,
            termination: &AlwaysRunning,
            progress: &EmptyProgressTracker,
        }
    }

    /// Run on an existing pool instead of building one per call
    #[must_use]
    pub fn with_pool(mut self, pool: &'a ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Stop early once `termination` reports not running
    #[must_use]
    pub fn with_termination(mut self, termination: &'a dyn TerminationSignal) -> Self {
        self.termination = termination;
        self
    }

    /// Report one unit of progress per processed node
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Compute degrees for every node
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a zero concurrency, before any task runs
    /// - `Cancelled` if the termination signal stopped the run; partial
    ///   results are discarded
    /// - the first task error, unchanged
    pub fn compute(&self) -> Result<Degrees<'a, G>> {
        let concurrency = self.config.validate()?;
        let aggregation = Aggregation::resolve(self.config.orientation, self.config.weighted);
        let node_count = self.graph.node_count();
        info!(
            orientation = %self.config.orientation,
            weighted = self.config.weighted,
            node_count,
            concurrency = concurrency.value(),
            "degree centrality started"
        );

        if aggregation == Aggregation::NaturalCount {
            self.termination.assert_running()?;
            return Ok(Degrees::Graph(self.graph));
        }

        let partitions =
            degree_partition(self.graph, concurrency.value(), self.config.min_batch_size)?;
        // an owned pool never outgrows the host; extra workers queue on it
        let owned_pool;
        let pool = if let Some(pool) = self.pool {
            pool
        } else {
            owned_pool = build_pool(concurrency.capped_to_host())?;
            &owned_pool
        };
        let executor = RunWithConcurrency::new(concurrency, pool).with_termination(self.termination);

        self.progress.begin_sub_task(TASK_NAME, node_count);
        let result = self.aggregate(aggregation, &executor, &partitions);
        self.progress.end_sub_task(TASK_NAME);

        let degrees = result?;
        info!(partitions = partitions.len(), "degree centrality finished");
        Ok(degrees)
    }

    fn aggregate(
        &self,
        aggregation: Aggregation,
        executor: &RunWithConcurrency<'_>,
        partitions: &[Partition],
    ) -> Result<Degrees<'a, G>> {
        let node_count = self.graph.node_count();
        let policy = self.config.non_positive_weights;

        match aggregation {
            Aggregation::NaturalCount => Ok(Degrees::Graph(self.graph)),
            Aggregation::NaturalWeighted => {
                let mut values = HugeDoubleArray::new(node_count);
                let writers = values.partition_writers(partitions)?;
                let tasks: Vec<_> = partitions
                    .iter()
                    .zip(writers)
                    .map(|(&partition, mut writer)| {
                        let graph = self.graph.concurrent_copy();
                        move || {
                            self.visit_partition(partition, |node| {
                                let mut sum = 0.0;
                                graph.for_each_weighted_relationship(
                                    node,
                                    DEFAULT_WEIGHT,
                                    &mut |_, _, weight| {
                                        sum += policy.apply(weight);
                                        true
                                    },
                                );
                                writer.set(node, sum)
                            })
                        }
                    })
                    .collect();
                executor.run(tasks)?;
                Ok(Degrees::Values(values))
            }
            Aggregation::ReverseCount => {
                let counts = HugeAtomicLongArray::new(node_count);
                self.run_shared(executor, partitions, |graph, node| {
                    try_for_each_target(graph, node, |target| {
                        counts.get_and_add(target, 1).map(drop)
                    })
                })?;
                Ok(Degrees::Counts(counts))
            }
            Aggregation::ReverseWeighted => {
                let weights = HugeAtomicDoubleArray::new(node_count);
                self.run_shared(executor, partitions, |graph, node| {
                    try_for_each_weighted(graph, node, |target, weight| {
                        weights.get_and_add(target, policy.apply(weight)).map(drop)
                    })
                })?;
                Ok(Degrees::Weights(weights))
            }
            Aggregation::UndirectedCount => {
                let counts = HugeAtomicLongArray::new(node_count);
                self.run_shared(executor, partitions, |graph, node| {
                    #[allow(clippy::cast_possible_wrap)] // counts wrap on overflow
                    let own = graph.degree(node) as i64;
                    counts.get_and_add(node, own)?;
                    try_for_each_target(graph, node, |target| {
                        counts.get_and_add(target, 1).map(drop)
                    })
                })?;
                Ok(Degrees::Counts(counts))
            }
            Aggregation::UndirectedWeighted => {
                let weights = HugeAtomicDoubleArray::new(node_count);
                self.run_shared(executor, partitions, |graph, node| {
                    let mut own = 0.0;
                    try_for_each_weighted(graph, node, |target, weight| {
                        let weight = policy.apply(weight);
                        own += weight;
                        weights.get_and_add(target, weight).map(drop)
                    })?;
                    weights.get_and_add(node, own).map(drop)
                })?;
                Ok(Degrees::Weights(weights))
            }
        }
    }

    /// One task per partition, all sharing `visit`
    fn run_shared<F>(
        &self,
        executor: &RunWithConcurrency<'_>,
        partitions: &[Partition],
        visit: F,
    ) -> Result<()>
    where
        F: Fn(&G, u64) -> ComputeResult<()> + Sync,
    {
        let visit = &visit;
        let tasks: Vec<_> = partitions
            .iter()
            .map(|&partition| {
                let graph = self.graph.concurrent_copy();
                move || self.visit_partition(partition, |node| visit(&graph, node))
            })
            .collect();
        executor.run(tasks)
    }

    fn visit_partition(
        &self,
        partition: Partition,
        mut visit: impl FnMut(u64) -> ComputeResult<()>,
    ) -> Result<()> {
        for node in partition.nodes() {
            self.termination.assert_running()?;
            visit(node)?;
        }
        self.progress.log_progress(partition.node_count());
        Ok(())
    }
}

/// Degree centrality with a pool built for this call
///
/// # Errors
///
/// Same as [`DegreeCentrality::compute`]
pub fn degree_centrality<'a, G: Graph>(
    graph: &'a G,
    config: &DegreeCentralityConfig,
) -> Result<Degrees<'a, G>> {
    DegreeCentrality::new(graph, config.clone()).compute()
}

/// Apply `f` to each stored target of `node`, stopping at the first error
fn try_for_each_target<G: Graph>(
    graph: &G,
    node: u64,
    mut f: impl FnMut(u64) -> ComputeResult<()>,
) -> ComputeResult<()> {
    let mut outcome = Ok(());
    graph.for_each_relationship(node, Orientation::Natural, &mut |_, target| {
        outcome = f(target);
        outcome.is_ok()
    });
    outcome
}

fn try_for_each_weighted<G: Graph>(
    graph: &G,
    node: u64,
    mut f: impl FnMut(u64, f64) -> ComputeResult<()>,
) -> ComputeResult<()> {
    let mut outcome = Ok(());
    graph.for_each_weighted_relationship(node, DEFAULT_WEIGHT, &mut |_, target, weight| {
        outcome = f(target, weight);
        outcome.is_ok()
    });
    outcome
}
