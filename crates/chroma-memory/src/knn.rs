//! Label Neighbor Graph.
//!
//! For the first `active_labels` centroids of a [`LabelIndex`], precomputes
//! each centroid's `neighbor_count` nearest *other* active centroids.  Edges
//! are directed and need not be symmetric: A's nearest K may omit B even when
//! B's nearest K include A.
//!
//! Building is O(active_labels²).  A graph is built once per
//! `(active_labels, neighbor_count)` pair and reused; [`KnnCache`] holds the
//! graphs a single worker has built so far.
//!
//! # Example
//!
//! ```rust
//! use chroma_memory::knn::LabelNeighborGraph;
//! use chroma_memory::semantic::LabelIndex;
//!
//! let index = LabelIndex::from_tsv(
//!     "4\tblack\t#000000\n3\tgrey\t#808080\n2\twhite\t#FFFFFF\n1\tcharcoal\t#202020\n",
//!     0,
//! ).unwrap();
//! let graph = LabelNeighborGraph::build(&index, 4, 2);
//!
//! assert_eq!(graph.neighbors_of("black"), vec!["charcoal", "grey"]);
//! assert!(graph.neighbors_of("mauve").is_empty());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::semantic::LabelIndex;

// ─────────────────────────────────────────────────────────────────────────────
// NeighborEdge
// ─────────────────────────────────────────────────────────────────────────────

/// A directed edge from a centroid to one of its nearest neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborEdge {
    pub centroid: String,
    pub neighbor: String,
    pub distance: u16,
}

// ─────────────────────────────────────────────────────────────────────────────
// LabelNeighborGraph
// ─────────────────────────────────────────────────────────────────────────────

/// K-nearest-neighbor graph over the active centroids.
#[derive(Debug, Clone)]
pub struct LabelNeighborGraph {
    active_labels: usize,
    neighbor_count: usize,
    edges: HashMap<String, Vec<NeighborEdge>>,
}

impl LabelNeighborGraph {
    /// Build the graph for the first `active_labels` centroids of `index`,
    /// keeping `neighbor_count` neighbors per centroid.
    ///
    /// Neighbors are ordered by ascending distance; equal distances keep the
    /// centroids' rank order.
    pub fn build(index: &LabelIndex, active_labels: usize, neighbor_count: usize) -> Self {
        let active = index.active(active_labels);
        let mut edges = HashMap::with_capacity(active.len());

        for (i, centroid) in active.iter().enumerate() {
            let mut candidates: Vec<NeighborEdge> = active
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| NeighborEdge {
                    centroid: centroid.name.clone(),
                    neighbor: other.name.clone(),
                    distance: centroid.color.distance(&other.color),
                })
                .collect();
            // sort_by_key is stable, so ties stay in rank order.
            candidates.sort_by_key(|e| e.distance);
            candidates.truncate(neighbor_count);
            edges.insert(centroid.name.clone(), candidates);
        }

        debug!(labels = active.len(), neighbor_count, "built label neighbor graph");
        Self {
            active_labels: active.len(),
            neighbor_count,
            edges,
        }
    }

    /// Neighbor label names of `name` in nearest-first order.
    ///
    /// Empty when `name` is not an active label or `neighbor_count` is 0.
    pub fn neighbors_of(&self, name: &str) -> Vec<&str> {
        self.edges_of(name).iter().map(|e| e.neighbor.as_str()).collect()
    }

    /// Outgoing edges of `name` in nearest-first order.
    pub fn edges_of(&self, name: &str) -> &[NeighborEdge] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of centroids the graph was built over.
    pub fn active_labels(&self) -> usize {
        self.active_labels
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbor_count
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// KnnCache
// ─────────────────────────────────────────────────────────────────────────────

/// Build-once store of neighbor graphs keyed by
/// `(active_labels, neighbor_count)`.
///
/// A cache belongs to one worker; workers never share one.
#[derive(Debug, Default)]
pub struct KnnCache {
    graphs: HashMap<(usize, usize), LabelNeighborGraph>,
}

impl KnnCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the graph for the given pair, building it on first use.
    pub fn get_or_build(
        &mut self,
        index: &LabelIndex,
        active_labels: usize,
        neighbor_count: usize,
    ) -> &LabelNeighborGraph {
        self.graphs
            .entry((active_labels, neighbor_count))
            .or_insert_with(|| LabelNeighborGraph::build(index, active_labels, neighbor_count))
    }

    pub fn get(&self, active_labels: usize, neighbor_count: usize) -> Option<&LabelNeighborGraph> {
        self.graphs.get(&(active_labels, neighbor_count))
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
