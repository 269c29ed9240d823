//! Trial runner.
//!
//! A trial is one self-contained experiment: generate a seeded color stream,
//! record it into a fresh [`EpisodeStore`] under a [`ChangeSchedule`], then ask
//! the [`RetrievalEngine`] for the episode nearest a target.  The store is
//! dropped when the trial ends.
//!
//! Trials share nothing mutable, so [`run_batch`] fans them out over a rayon
//! pool.  Each pool task gets its own [`TrialRunner`] (and therefore its own
//! neighbor graph cache); the label index is shared read-only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chroma_memory::{ChangeSchedule, EpisodeStore, EpisodicError, LabelIndex};
use chroma_types::{ChromaError, Color, RetrievalOutcome};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::retrieval::{RetrievalConfig, RetrievalEngine};
use crate::source::{ColorSource, SequenceKind};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum TrialError {
    #[error(transparent)]
    Chroma(#[from] ChromaError),

    #[error("Episode store error: {0}")]
    Episodic(#[from] EpisodicError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to reproduce one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Length of the recorded color stream.
    pub num_episodes: usize,
    pub sequence: SequenceKind,
    pub seed: u64,
    /// Color to retrieve.
    pub target: Color,
    #[serde(flatten)]
    pub retrieval: RetrievalConfig,
    /// Label-count schedule of the stream.  Without one, `num_labels` labels
    /// are active for the whole stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSchedule>,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            num_episodes: 1000,
            sequence: SequenceKind::Random,
            seed: 8_675_309,
            target: Color::new(0x80, 0x80, 0x80),
            retrieval: RetrievalConfig::default(),
            changes: None,
        }
    }
}

impl TrialConfig {
    /// The schedule the stream is recorded under.
    pub fn schedule(&self) -> Result<ChangeSchedule, ChromaError> {
        match &self.changes {
            Some(changes) => Ok(changes.clone()),
            None => ChangeSchedule::constant(self.retrieval.num_labels),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one trial plus the context needed to interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    pub config: TrialConfig,
    /// Rank of the target's label in the full centroid list.
    pub target_label_rank: Option<usize>,
    /// First timestamp from which the target's label could be assigned to
    /// recorded episodes.
    pub target_label_onset: Option<u64>,
    pub outcome: RetrievalOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TrialRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Runs trials one after another, reusing neighbor graphs between them.
#[derive(Debug)]
pub struct TrialRunner {
    engine: RetrievalEngine,
}

impl TrialRunner {
    pub fn new(labels: Arc<LabelIndex>) -> Self {
        Self { engine: RetrievalEngine::new(labels) }
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    pub fn run(&mut self, config: &TrialConfig) -> Result<TrialReport, TrialError> {
        let started_at = Utc::now();
        let schedule = config.schedule()?;
        let colors = ColorSource::new(config.seed).generate(config.sequence, config.num_episodes);
        let store = EpisodeStore::build_with_changes(self.engine.labels(), &colors, &schedule)?;
        debug!(
            seed = config.seed,
            episodes = store.len(),
            labels = store.labels().count(),
            "episode store recorded"
        );

        let outcome = self.engine.retrieve(&store, config.target, &config.retrieval)?;

        let labels = self.engine.labels();
        let target_label_rank = labels
            .classify(&config.target, config.retrieval.num_labels)
            .and_then(|name| labels.label_rank(name));
        let target_label_onset = target_label_rank.and_then(|rank| schedule.onset_of_rank(rank));

        info!(
            seed = config.seed,
            algorithm = %config.retrieval.algorithm,
            answer = outcome.answer.map(|c| c.to_hex()),
            scanned = outcome.total_episodes_scanned,
            fallbacks = outcome.num_fallbacks,
            "trial finished"
        );

        Ok(TrialReport {
            config: config.clone(),
            target_label_rank,
            target_label_onset,
            outcome,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Run independent trials in parallel.
///
/// Results come back in the order of `configs`; one failing trial does not
/// stop the others.
pub fn run_batch(
    labels: Arc<LabelIndex>,
    configs: &[TrialConfig],
) -> Vec<Result<TrialReport, TrialError>> {
    info!(trials = configs.len(), "starting batch");
    configs
        .par_iter()
        .map_init(
            || TrialRunner::new(Arc::clone(&labels)),
            |runner, config| runner.run(config),
        )
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
