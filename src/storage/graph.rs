//! Graph view consumed by partitioned algorithms
//!
//! Algorithms only see node ids in `[0, node_count)` and relationships
//! reached through callbacks. A callback returns `false` to stop iterating.

use crate::error::ComputeError;
use std::fmt;
use std::str::FromStr;

/// Traversal direction convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Relationships as stored
    #[default]
    Natural,
    /// Relationships transposed
    Reverse,
    /// Both directions merged
    Undirected,
}

impl Orientation {
    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Natural => "NATURAL",
            Self::Reverse => "REVERSE",
            Self::Undirected => "UNDIRECTED",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ComputeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NATURAL" => Ok(Self::Natural),
            "REVERSE" => Ok(Self::Reverse),
            "UNDIRECTED" => Ok(Self::Undirected),
            _ => Err(ComputeError::invalid(format!(
                "unsupported orientation `{value}`, expected NATURAL, REVERSE or UNDIRECTED"
            ))),
        }
    }
}

/// Read-only graph capability
///
/// Implementations must be cheap to share across worker threads.
/// `degree` and the iterators are undefined for ids outside
/// `[0, node_count)`; the CSR implementation reports zero relationships.
pub trait Graph: Send + Sync {
    /// Number of nodes
    fn node_count(&self) -> u64;

    /// Number of stored relationships
    fn relationship_count(&self) -> u64;

    /// Stored (outgoing) degree of `node`
    fn degree(&self, node: u64) -> u64;

    /// True if relationships carry a weight property
    fn has_relationship_property(&self) -> bool;

    /// Visit `(node, other)` for each relationship of `node` under `orientation`
    ///
    /// `Undirected` visits outgoing relationships first, then incoming ones.
    fn for_each_relationship(
        &self,
        node: u64,
        orientation: Orientation,
        consumer: &mut dyn FnMut(u64, u64) -> bool,
    );

    /// Visit `(node, target, weight)` for each stored relationship of `node`
    ///
    /// `fallback_weight` is reported when the graph has no weight property.
    fn for_each_weighted_relationship(
        &self,
        node: u64,
        fallback_weight: f64,
        consumer: &mut dyn FnMut(u64, u64, f64) -> bool,
    );

    /// Independent handle for one worker
    #[must_use]
    fn concurrent_copy(&self) -> Self
    where
        Self: Sized;
}
