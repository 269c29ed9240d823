//! Episodic Memory Store.
//!
//! An append-only, time-ordered record of color observations.  Each
//! [`Episode`] carries the semantic label it was classified into *when it
//! was recorded*, so a store built under a [`ChangeSchedule`] holds labels
//! computed against different active label counts over different timestamp
//! ranges.
//!
//! # Layout
//!
//! [`EpisodeStore`] keeps a primary vector of episodes in ascending
//! timestamp order and a secondary index from label name to positions in
//! that vector.  Only two query shapes exist, both time-ordered:
//!
//! | query | returns |
//! |---|---|
//! | [`query_all`][EpisodeStore::query_all] | every episode |
//! | [`query_by_label`][EpisodeStore::query_by_label] | episodes with exactly that label |
//!
//! The retrieval engine does not depend on this type directly but on the
//! [`EpisodeIndex`] trait, which the SQLite-backed
//! [`SqliteEpisodeStore`][crate::sqlite::SqliteEpisodeStore] implements too.
//!
//! # Example
//!
//! ```rust
//! use chroma_memory::episodic::EpisodeStore;
//! use chroma_memory::schedule::ChangeSchedule;
//! use chroma_memory::semantic::LabelIndex;
//! use chroma_types::Color;
//!
//! let labels = LabelIndex::from_tsv("3\tblack\t#000000\n2\twhite\t#FFFFFF\n1\tred\t#FF0000\n", 0).unwrap();
//! let colors = [Color::new(0, 0, 0), Color::new(255, 255, 255), Color::new(255, 0, 0)];
//!
//! // Two labels active for the first two episodes, three afterwards.
//! let schedule = ChangeSchedule::new(vec![(0, 2), (2, 3)]).unwrap();
//! let store = EpisodeStore::build_with_changes(&labels, &colors, &schedule).unwrap();
//!
//! assert_eq!(store.len(), 3);
//! let reds: Vec<u64> = store.query_by_label("red").map(|e| e.timestamp).collect();
//! assert_eq!(reds, vec![2]);
//! ```

use std::collections::HashMap;

use chroma_types::{Color, Episode};
use thiserror::Error;
use tracing::debug;

use crate::schedule::ChangeSchedule;
use crate::semantic::LabelIndex;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from episode store operations.
#[derive(Error, Debug)]
pub enum EpisodicError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Timestamp {start} would precede the next free timestamp {next}")]
    NonMonotonic { start: u64, next: u64 },
    #[error("No active labels to classify episodes with")]
    NoActiveLabels,
}

// ─────────────────────────────────────────────────────────────────────────────
// EpisodeIndex
// ─────────────────────────────────────────────────────────────────────────────

/// The two fixed query shapes the retrieval engine issues.
///
/// Both scans must visit episodes in ascending timestamp order and must not
/// mutate the store.
pub trait EpisodeIndex {
    /// Visit every episode.
    fn scan_all(&self, visit: &mut dyn FnMut(&Episode)) -> Result<(), EpisodicError>;

    /// Visit every episode whose label is exactly `label`.
    fn scan_label(&self, label: &str, visit: &mut dyn FnMut(&Episode)) -> Result<(), EpisodicError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// EpisodeStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory episode store indexed by label.
#[derive(Debug, Clone, Default)]
pub struct EpisodeStore {
    episodes: Vec<Episode>,
    by_label: HashMap<String, Vec<usize>>,
}

impl EpisodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `colors`, labelling each slice of the sequence with
    /// the label count the schedule assigns to it.
    pub fn build_with_changes(
        labels: &LabelIndex,
        colors: &[Color],
        schedule: &ChangeSchedule,
    ) -> Result<Self, EpisodicError> {
        let mut store = Self::new();
        for (range, label_count) in schedule.slices(colors.len()) {
            let start = range.start as u64;
            store.append(labels, &colors[range], label_count, start)?;
        }
        debug!(
            episodes = store.len(),
            labels = store.by_label.len(),
            intervals = schedule.intervals().len(),
            "built episode store"
        );
        Ok(store)
    }

    /// Append one episode per color with timestamps `start, start + 1, …`,
    /// each labelled against the first `active_labels` centroids.
    ///
    /// # Errors
    ///
    /// - [`EpisodicError::NonMonotonic`] if `start` is not after the last
    ///   stored timestamp.
    /// - [`EpisodicError::NoActiveLabels`] if no centroid is active.
    pub fn append(
        &mut self,
        labels: &LabelIndex,
        colors: &[Color],
        active_labels: usize,
        start: u64,
    ) -> Result<(), EpisodicError> {
        if colors.is_empty() {
            return Ok(());
        }
        let next = self.next_timestamp();
        if !self.episodes.is_empty() && start < next {
            return Err(EpisodicError::NonMonotonic { start, next });
        }
        if labels.active(active_labels).is_empty() {
            return Err(EpisodicError::NoActiveLabels);
        }

        self.episodes.reserve(colors.len());
        for (offset, color) in colors.iter().enumerate() {
            let label = labels
                .classify(color, active_labels)
                .ok_or(EpisodicError::NoActiveLabels)?
                .to_string();
            let position = self.episodes.len();
            self.by_label.entry(label.clone()).or_default().push(position);
            self.episodes.push(Episode {
                timestamp: start + offset as u64,
                color: *color,
                label,
            });
        }
        Ok(())
    }

    /// Every episode in ascending timestamp order.
    pub fn query_all(&self) -> &[Episode] {
        &self.episodes
    }

    /// Episodes labelled exactly `label`, in ascending timestamp order.
    pub fn query_by_label<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Episode> + use<'a> {
        self.by_label
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&position| &self.episodes[position])
    }

    /// Number of episodes carrying `label`.
    pub fn label_len(&self, label: &str) -> usize {
        self.by_label.get(label).map_or(0, Vec::len)
    }

    /// Distinct labels present in the store (unordered).
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(String::as_str)
    }

    /// Timestamp the next appended episode may start at.
    pub fn next_timestamp(&self) -> u64 {
        self.episodes.last().map_or(0, |e| e.timestamp + 1)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

impl EpisodeIndex for EpisodeStore {
    fn scan_all(&self, visit: &mut dyn FnMut(&Episode)) -> Result<(), EpisodicError> {
        self.episodes.iter().for_each(visit);
        Ok(())
    }

    fn scan_label(&self, label: &str, visit: &mut dyn FnMut(&Episode)) -> Result<(), EpisodicError> {
        self.query_by_label(label).for_each(visit);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
