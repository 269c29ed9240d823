//! Shared value types for the chroma wanderer workspace.
//!
//! - [`Color`] – the RGB value object and its L1 metric.
//! - [`LabeledColor`] – a named reference color (a semantic label centroid).
//! - [`Episode`] – one recorded `(timestamp, color, label)` observation.
//! - [`Algorithm`] / [`Tier`] – retrieval strategy selection and the tiers of
//!   the fallback cascade.
//! - [`RetrievalOutcome`] – the per-trial result record.
//! - [`ChromaError`] – the global error type.

pub mod color;

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use color::{Color, MAX_DISTANCE, distance};

/// A reference color representing a semantic label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledColor {
    /// Unique label name (e.g. `"sky blue"`).
    pub name: String,
    pub color: Color,
    /// How often the name was given in the source survey; the centroid list is
    /// ranked by this.
    pub support: u64,
}

/// One recorded observation in an episode store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Episode {
    /// Position in the stream; unique and increasing within a store.
    pub timestamp: u64,
    pub color: Color,
    /// Name of the nearest active centroid when the episode was recorded.
    pub label: String,
}

/// Which retrieval strategy a trial uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Scan every episode.
    BruteForce,
    /// Scan the target's own label, falling back to a full scan.
    ExactHeuristic,
    /// Exact label, then neighbor labels, then a full scan.
    NeighborHeuristic,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::BruteForce,
        Algorithm::ExactHeuristic,
        Algorithm::NeighborHeuristic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::BruteForce => "brute-force",
            Algorithm::ExactHeuristic => "exact-heuristic",
            Algorithm::NeighborHeuristic => "neighbor-heuristic",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ChromaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ChromaError::UnknownAlgorithm(s.to_string()))
    }
}

/// One strategy in the retrieval cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Exact,
    Neighbor,
    BruteForce,
}

/// What a single tier did during one retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TierReport {
    pub tier: Tier,
    /// Episodes examined by this tier.
    pub scanned: u64,
    /// Whether the tier produced a candidate.
    pub found: bool,
}

/// Result record of one retrieval cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetrievalOutcome {
    /// Color of the chosen episode; `None` only when the store was empty.
    pub answer: Option<Color>,
    pub answer_timestamp: Option<u64>,
    /// Label the target was classified into, when a heuristic ran.
    pub target_label: Option<String>,
    /// Sum of episodes examined by every tier that ran.
    pub total_episodes_scanned: u64,
    /// Tiers run beyond the first.
    pub num_fallbacks: u32,
    /// Wall-clock duration of the cascade in seconds.
    pub elapsed_secs: f64,
    pub tiers: Vec<TierReport>,
}

impl RetrievalOutcome {
    /// `true` when no episode existed to be scanned.
    pub fn is_empty_store(&self) -> bool {
        self.total_episodes_scanned == 0
    }
}

/// Global error type for value parsing and reference data.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromaError {
    #[error("Malformed color: {0:?} (expected six hex digits, optionally prefixed by '#')")]
    MalformedColor(String),

    #[error("Invalid centroid data on line {line}: {reason}")]
    InvalidCentroidData { line: usize, reason: String },

    #[error("Invalid change schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unknown algorithm: {0:?}")]
    UnknownAlgorithm(String),
}
