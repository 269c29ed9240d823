//! `chroma-memory` – the agent's episodic memory and its semantic indexes.
//!
//! # Modules
//!
//! - [`semantic`] – [`LabelIndex`][semantic::LabelIndex]: the ranked list of
//!   named reference colors and nearest-label classification.
//! - [`knn`] – [`LabelNeighborGraph`][knn::LabelNeighborGraph]: each active
//!   label's K nearest other labels, plus the per-worker
//!   [`KnnCache`][knn::KnnCache] that builds each graph once.
//! - [`schedule`] – [`ChangeSchedule`][schedule::ChangeSchedule]: which label
//!   count is active over which stretch of an episode stream.
//! - [`episodic`] – [`EpisodeStore`][episodic::EpisodeStore]: the
//!   time-ordered, label-indexed episode store, and the
//!   [`EpisodeIndex`][episodic::EpisodeIndex] query trait.
//! - [`sqlite`] – [`SqliteEpisodeStore`][sqlite::SqliteEpisodeStore]: the same
//!   two queries answered from a SQLite database.

pub mod episodic;
pub mod knn;
pub mod schedule;
pub mod semantic;
pub mod sqlite;

pub use episodic::{EpisodeIndex, EpisodeStore, EpisodicError};
pub use knn::{KnnCache, LabelNeighborGraph, NeighborEdge};
pub use schedule::{ChangeSchedule, LabelInterval};
pub use semantic::{DEFAULT_MIN_SUPPORT, LabelIndex};
pub use sqlite::SqliteEpisodeStore;
