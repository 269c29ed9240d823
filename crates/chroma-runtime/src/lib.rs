//! `chroma-runtime` – tiered nearest-color retrieval and the trial harness
//! around it.
//!
//! # Modules
//!
//! - [`retrieval`] – [`RetrievalEngine`][retrieval::RetrievalEngine]: the
//!   exact → neighbor → brute-force cascade over any
//!   [`EpisodeIndex`][chroma_memory::EpisodeIndex].
//! - [`source`] – seeded uniform and random-walk color streams.
//! - [`trial`] – [`TrialRunner`][trial::TrialRunner] and the rayon-backed
//!   [`run_batch`][trial::run_batch].
//! - [`config`] – the `chroma.toml` experiment file with `CHROMA_*`
//!   environment overrides.
//! - [`telemetry`] – `tracing` subscriber and optional OTLP export.

pub mod config;
pub mod retrieval;
pub mod source;
pub mod telemetry;
pub mod trial;

pub use config::{ConfigError, ExperimentConfig};
pub use retrieval::{RetrievalConfig, RetrievalEngine};
pub use source::{ColorSource, SequenceKind};
pub use trial::{TrialConfig, TrialError, TrialReport, TrialRunner, run_batch};
