//! Tiered Retrieval Engine.
//!
//! Answers "which recorded color is closest to this target?" by scanning as
//! little of the episode store as possible.  Up to three tiers run in order:
//!
//! | Tier | Runs when | Scans |
//! |---|---|---|
//! | [`Tier::Exact`] | algorithm is `exact-heuristic` or `neighbor-heuristic` | episodes labelled like the target |
//! | [`Tier::Neighbor`] | algorithm is `neighbor-heuristic` and (no exact candidate, or `always_use_neighbors`) | episodes of each neighbor label of the target |
//! | [`Tier::BruteForce`] | algorithm is `brute-force`, or no earlier tier found a candidate | every episode |
//!
//! Candidates compare by distance to the target; equal distances go to the
//! earlier timestamp, both within a tier and across tiers.
//!
//! The engine only sees the store through [`EpisodeIndex`], so the in-memory
//! and SQLite backends are interchangeable.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chroma_memory::{ChangeSchedule, EpisodeStore, LabelIndex};
//! use chroma_runtime::retrieval::{RetrievalConfig, RetrievalEngine};
//! use chroma_types::{Algorithm, Color};
//!
//! let labels = Arc::new(LabelIndex::bundled().unwrap());
//! let colors = [Color::new(250, 5, 5), Color::new(5, 5, 250)];
//! let store =
//!     EpisodeStore::build_with_changes(&labels, &colors, &ChangeSchedule::constant(20).unwrap()).unwrap();
//!
//! let mut engine = RetrievalEngine::new(labels);
//! let config = RetrievalConfig { algorithm: Algorithm::BruteForce, ..RetrievalConfig::default() };
//! let outcome = engine.retrieve(&store, Color::new(255, 0, 0), &config).unwrap();
//! assert_eq!(outcome.answer, Some(Color::new(250, 5, 5)));
//! assert_eq!(outcome.total_episodes_scanned, 2);
//! ```

use std::sync::Arc;
use std::time::Instant;

use chroma_memory::{EpisodeIndex, EpisodicError, KnnCache, LabelIndex};
use chroma_types::{Algorithm, Color, Episode, RetrievalOutcome, Tier, TierReport};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Per-query knobs of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub algorithm: Algorithm,
    /// Active label count used to classify the target.
    pub num_labels: usize,
    /// Neighbor labels consulted by the neighbor tier.
    pub num_neighbors: usize,
    /// Run the neighbor tier even when the exact tier found a candidate.
    pub always_use_neighbors: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::NeighborHeuristic,
            num_labels: 20,
            num_neighbors: 5,
            always_use_neighbors: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidate bookkeeping
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Candidate {
    distance: u16,
    episode: Episode,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        (self.distance, self.episode.timestamp) < (other.distance, other.episode.timestamp)
    }
}

/// Running minimum of one tier.
#[derive(Debug, Default)]
struct TierScan {
    scanned: u64,
    best: Option<Candidate>,
}

impl TierScan {
    fn visit(&mut self, target: &Color, episode: &Episode) {
        self.scanned += 1;
        let distance = target.distance(&episode.color);
        let improves = match &self.best {
            None => true,
            Some(best) => {
                distance < best.distance
                    || (distance == best.distance && episode.timestamp < best.episode.timestamp)
            }
        };
        if improves {
            self.best = Some(Candidate { distance, episode: episode.clone() });
        }
    }
}

/// Fold a finished tier into the cascade state.
fn settle(
    tier: Tier,
    scan: TierScan,
    best: &mut Option<Candidate>,
    reports: &mut Vec<TierReport>,
) {
    let found = scan.best.is_some();
    debug!(?tier, scanned = scan.scanned, found, "tier finished");
    reports.push(TierReport { tier, scanned: scan.scanned, found });
    if let Some(candidate) = scan.best
        && best.as_ref().is_none_or(|current| candidate.beats(current))
    {
        *best = Some(candidate);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RetrievalEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Runs the tier cascade against any [`EpisodeIndex`].
///
/// Owns a [`KnnCache`], so neighbor graphs are built once per
/// `(num_labels, num_neighbors)` pair and reused by every later query on the
/// same engine.  An engine is not shared between threads; give each worker
/// its own.
#[derive(Debug)]
pub struct RetrievalEngine {
    labels: Arc<LabelIndex>,
    graphs: KnnCache,
}

impl RetrievalEngine {
    pub fn new(labels: Arc<LabelIndex>) -> Self {
        Self { labels, graphs: KnnCache::new() }
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// Number of neighbor graphs built so far.
    pub fn cached_graphs(&self) -> usize {
        self.graphs.len()
    }

    /// Find the recorded color closest to `target`.
    ///
    /// An empty store is not an error: the outcome has no answer and zero
    /// episodes scanned.  Errors only come from the store backend.
    pub fn retrieve<S: EpisodeIndex + ?Sized>(
        &mut self,
        store: &S,
        target: Color,
        config: &RetrievalConfig,
    ) -> Result<RetrievalOutcome, EpisodicError> {
        let heuristic = config.algorithm != Algorithm::BruteForce;

        // Graph construction stays outside the timed section.
        let graph = if config.algorithm == Algorithm::NeighborHeuristic {
            Some(self.graphs.get_or_build(&self.labels, config.num_labels, config.num_neighbors))
        } else {
            None
        };

        let started = Instant::now();
        let target_label = if heuristic {
            self.labels.classify(&target, config.num_labels)
        } else {
            None
        };

        let mut best: Option<Candidate> = None;
        let mut reports = Vec::with_capacity(3);

        if heuristic {
            let mut scan = TierScan::default();
            if let Some(label) = target_label {
                store.scan_label(label, &mut |e| scan.visit(&target, e))?;
            }
            settle(Tier::Exact, scan, &mut best, &mut reports);
        }

        if let Some(graph) = graph
            && (best.is_none() || config.always_use_neighbors)
        {
            let mut scan = TierScan::default();
            if let Some(label) = target_label {
                for edge in graph.edges_of(label) {
                    store.scan_label(&edge.neighbor, &mut |e| scan.visit(&target, e))?;
                }
            }
            settle(Tier::Neighbor, scan, &mut best, &mut reports);
        }

        if !heuristic || best.is_none() {
            let mut scan = TierScan::default();
            store.scan_all(&mut |e| scan.visit(&target, e))?;
            settle(Tier::BruteForce, scan, &mut best, &mut reports);
        }

        let elapsed_secs = started.elapsed().as_secs_f64();
        let total_episodes_scanned = reports.iter().map(|r| r.scanned).sum();
        let num_fallbacks = reports.len().saturating_sub(1) as u32;

        debug!(
            algorithm = %config.algorithm,
            target_color = %target,
            target_label,
            total_episodes_scanned,
            num_fallbacks,
            elapsed_secs,
            "retrieval finished"
        );

        Ok(RetrievalOutcome {
            answer: best.as_ref().map(|c| c.episode.color),
            answer_timestamp: best.as_ref().map(|c| c.episode.timestamp),
            target_label: target_label.map(str::to_string),
            total_episodes_scanned,
            num_fallbacks,
            elapsed_secs,
            tiers: reports,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
