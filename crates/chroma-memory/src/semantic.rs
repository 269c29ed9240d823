//! Semantic Label Index.
//!
//! A fixed, ranked list of named reference colors ("centroids").  Any RGB
//! color can be classified into the nearest of the first *N* centroids, where
//! *N* is the active label count of the current configuration.
//!
//! ## Reference data
//!
//! The list is read from tab-separated rows of
//!
//! ```text
//! <support>\t<name>\t<#RRGGBB>
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.  Rows whose support is
//! below the minimum threshold are dropped; the rest are ranked by descending
//! support, ties keeping file order.  Every row is validated at load time, so
//! a malformed file fails immediately with
//! [`ChromaError::InvalidCentroidData`] rather than at classification time.
//!
//! A representative list ships with the crate, see [`LabelIndex::bundled`]:
//! xkcd color names with their published hex codes and synthetic,
//! rank-ordered support counts.
//!
//! # Example
//!
//! ```rust
//! use chroma_memory::semantic::LabelIndex;
//! use chroma_types::Color;
//!
//! let index = LabelIndex::from_tsv("900\tred\t#FF0000\n1200\tblue\t#0000FF\n", 0).unwrap();
//!
//! // "blue" has more support, so it ranks first.
//! assert_eq!(index.label_rank("blue"), Some(0));
//! assert_eq!(index.classify(&Color::new(250, 10, 10), 2), Some("red"));
//! // With a single active label everything is "blue".
//! assert_eq!(index.classify(&Color::new(250, 10, 10), 1), Some("blue"));
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chroma_types::{ChromaError, Color, LabeledColor};
use tracing::debug;

/// Default support threshold; the bundled list keeps all but its last two rows.
pub const DEFAULT_MIN_SUPPORT: u64 = 1000;

const BUNDLED_CENTROIDS: &str = include_str!("../data/color-centroids.tsv");

// ─────────────────────────────────────────────────────────────────────────────
// LabelIndex
// ─────────────────────────────────────────────────────────────────────────────

/// Ranked centroid list with nearest-label classification.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    centroids: Vec<LabeledColor>,
    ranks: HashMap<String, usize>,
}

impl LabelIndex {
    /// Build an index from centroids that are already in rank order.
    ///
    /// Returns [`ChromaError::InvalidCentroidData`] if two centroids share a
    /// name (the reported line is the 1-based position of the duplicate).
    pub fn new(centroids: Vec<LabeledColor>) -> Result<Self, ChromaError> {
        let mut ranks = HashMap::with_capacity(centroids.len());
        for (rank, centroid) in centroids.iter().enumerate() {
            if ranks.insert(centroid.name.clone(), rank).is_some() {
                return Err(ChromaError::InvalidCentroidData {
                    line: rank + 1,
                    reason: format!("duplicate label name {:?}", centroid.name),
                });
            }
        }
        Ok(Self { centroids, ranks })
    }

    /// Parse tab-separated reference rows, keeping those with
    /// `support >= min_support`.
    pub fn from_tsv(text: &str, min_support: u64) -> Result<Self, ChromaError> {
        let mut rows: Vec<(usize, LabeledColor)> = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let centroid = parse_row(line).map_err(|reason| ChromaError::InvalidCentroidData {
                line: line_no,
                reason,
            })?;
            rows.push((line_no, centroid));
        }

        // Duplicate names are rejected before filtering so the whole file is
        // validated, not just the part that survives the threshold.
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (line_no, centroid) in &rows {
            if let Some(first) = seen.insert(centroid.name.as_str(), *line_no) {
                return Err(ChromaError::InvalidCentroidData {
                    line: *line_no,
                    reason: format!("label {:?} already defined on line {first}", centroid.name),
                });
            }
        }

        let mut centroids: Vec<LabeledColor> = rows
            .into_iter()
            .map(|(_, c)| c)
            .filter(|c| c.support >= min_support)
            .collect();
        // Stable: equal support keeps file order.
        centroids.sort_by(|a, b| b.support.cmp(&a.support));

        debug!(labels = centroids.len(), min_support, "loaded centroid list");
        Self::new(centroids)
    }

    /// Read and parse a reference file.
    pub fn load(path: &Path, min_support: u64) -> Result<Self, ChromaError> {
        let text = fs::read_to_string(path).map_err(|e| ChromaError::InvalidCentroidData {
            line: 0,
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_tsv(&text, min_support)
    }

    /// The reference list shipped with this crate, filtered at
    /// [`DEFAULT_MIN_SUPPORT`].
    pub fn bundled() -> Result<Self, ChromaError> {
        Self::bundled_with_min_support(DEFAULT_MIN_SUPPORT)
    }

    /// The bundled reference list with a caller-chosen support threshold.
    pub fn bundled_with_min_support(min_support: u64) -> Result<Self, ChromaError> {
        Self::from_tsv(BUNDLED_CENTROIDS, min_support)
    }

    /// Name of the nearest of the first `active` centroids.
    ///
    /// Ties go to the higher-ranked centroid.  `active` is clamped to the list
    /// length; `None` when no centroid is active.
    pub fn classify(&self, color: &Color, active: usize) -> Option<&str> {
        self.nearest(color, active).map(|c| c.name.as_str())
    }

    /// Like [`classify`][Self::classify] but returns the whole centroid.
    pub fn nearest(&self, color: &Color, active: usize) -> Option<&LabeledColor> {
        // min_by_key returns the first minimum, which is the tie rule we want.
        self.active(active).iter().min_by_key(|c| c.color.distance(color))
    }

    /// Position of `name` in the full ranked list.
    pub fn label_rank(&self, name: &str) -> Option<usize> {
        self.ranks.get(name).copied()
    }

    /// The first `count` centroids (clamped to the list length).
    pub fn active(&self, count: usize) -> &[LabeledColor] {
        &self.centroids[..count.min(self.centroids.len())]
    }

    pub fn get(&self, name: &str) -> Option<&LabeledColor> {
        self.label_rank(name).map(|rank| &self.centroids[rank])
    }

    pub fn centroids(&self) -> &[LabeledColor] {
        &self.centroids
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

fn parse_row(line: &str) -> Result<LabeledColor, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [support, name, hex] = fields.as_slice() else {
        return Err(format!("expected 3 tab-separated fields, found {}", fields.len()));
    };
    let support = support
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid support count {support:?}: {e}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("empty label name".to_string());
    }
    let color = Color::from_hex(hex.trim()).map_err(|e| e.to_string())?;
    Ok(LabeledColor { name: name.to_string(), color, support })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
