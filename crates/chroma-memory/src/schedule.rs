//! Label-count change schedule.
//!
//! A [`ChangeSchedule`] says how many centroids are active over each stretch
//! of an episode stream.  It is an ordered list of `(start, label_count)`
//! intervals with strictly increasing starts; interval *i* covers
//! `[start_i, start_{i+1})` and the last interval runs to the end of whatever
//! stream it is applied to.  The first interval must start at 0 so that the
//! intervals always cover `[0, len)` exactly.
//!
//! # Example
//!
//! ```rust
//! use chroma_memory::schedule::ChangeSchedule;
//!
//! let schedule = ChangeSchedule::new(vec![(0, 2), (5, 3)]).unwrap();
//! let slices: Vec<_> = schedule.slices(8).collect();
//! assert_eq!(slices, vec![(0..5, 2), (5..8, 3)]);
//! ```

use std::ops::Range;

use chroma_types::ChromaError;
use serde::{Deserialize, Serialize};

/// One `(start, label_count)` entry of a [`ChangeSchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInterval {
    pub start: u64,
    pub label_count: usize,
}

/// Validated interval list mapping stream positions to active label counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(u64, usize)>", into = "Vec<(u64, usize)>")]
pub struct ChangeSchedule {
    intervals: Vec<LabelInterval>,
}

impl ChangeSchedule {
    /// Validate and build a schedule from `(start, label_count)` pairs.
    ///
    /// # Errors
    ///
    /// [`ChromaError::InvalidSchedule`] when the list is empty, does not start
    /// at 0, is not strictly increasing, or has a zero label count.
    pub fn new(pairs: Vec<(u64, usize)>) -> Result<Self, ChromaError> {
        let Some(&(first, _)) = pairs.first() else {
            return Err(ChromaError::InvalidSchedule("schedule is empty".to_string()));
        };
        if first != 0 {
            return Err(ChromaError::InvalidSchedule(format!(
                "first interval starts at {first}, expected 0"
            )));
        }
        if let Some(w) = pairs.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(ChromaError::InvalidSchedule(format!(
                "interval start {} does not follow {}",
                w[1].0, w[0].0
            )));
        }
        if let Some(&(start, _)) = pairs.iter().find(|(_, count)| *count == 0) {
            return Err(ChromaError::InvalidSchedule(format!(
                "interval starting at {start} has no active labels"
            )));
        }
        Ok(Self {
            intervals: pairs
                .into_iter()
                .map(|(start, label_count)| LabelInterval { start, label_count })
                .collect(),
        })
    }

    /// A single interval: `label_count` labels for the whole stream.
    pub fn constant(label_count: usize) -> Result<Self, ChromaError> {
        Self::new(vec![(0, label_count)])
    }

    /// Evenly spaced schedule growing one label at a time.
    ///
    /// Starts with `ceil(num_labels / 10)` labels and adds one per step until
    /// `num_labels` are active, spreading the steps evenly over
    /// `num_episodes`.  When steps would collide (more steps than episodes)
    /// only the last count at each start is kept.
    pub fn progressive(num_episodes: u64, num_labels: usize) -> Result<Self, ChromaError> {
        let initial = num_labels.div_ceil(10);
        let steps = num_labels.saturating_sub(initial) + 1;
        let per_step = num_episodes as f64 / steps as f64;
        let mut pairs: Vec<(u64, usize)> = Vec::with_capacity(steps);
        for i in 0..steps {
            let start = (i as f64 * per_step).floor() as u64;
            let count = initial + i;
            match pairs.last_mut() {
                Some(last) if last.0 == start => last.1 = count,
                _ => pairs.push((start, count)),
            }
        }
        Self::new(pairs)
    }

    pub fn intervals(&self) -> &[LabelInterval] {
        &self.intervals
    }

    /// Active label count at `timestamp`.
    pub fn label_count_at(&self, timestamp: u64) -> usize {
        // The first interval starts at 0, so partition_point is at least 1.
        let idx = self.intervals.partition_point(|iv| iv.start <= timestamp);
        self.intervals[idx - 1].label_count
    }

    /// Largest label count the schedule ever activates.
    pub fn max_label_count(&self) -> usize {
        self.intervals.iter().map(|iv| iv.label_count).max().unwrap_or(0)
    }

    /// First start at which at least `rank + 1` labels are active, i.e. the
    /// first timestamp at which the label of that rank can be assigned.
    pub fn onset_of_rank(&self, rank: usize) -> Option<u64> {
        self.intervals
            .iter()
            .find(|iv| iv.label_count > rank)
            .map(|iv| iv.start)
    }

    /// Split `[0, len)` into the contiguous slices each interval governs.
    ///
    /// The last interval extends to `len`; intervals starting at or after
    /// `len` produce nothing.
    pub fn slices(&self, len: usize) -> impl Iterator<Item = (Range<usize>, usize)> + '_ {
        let len_u64 = len as u64;
        self.intervals
            .iter()
            .enumerate()
            .filter(move |(_, iv)| iv.start < len_u64)
            .map(move |(i, iv)| {
                let end = self
                    .intervals
                    .get(i + 1)
                    .map_or(len_u64, |next| next.start.min(len_u64));
                (iv.start as usize..end as usize, iv.label_count)
            })
    }
}

impl TryFrom<Vec<(u64, usize)>> for ChangeSchedule {
    type Error = ChromaError;

    fn try_from(pairs: Vec<(u64, usize)>) -> Result<Self, Self::Error> {
        Self::new(pairs)
    }
}

impl From<ChangeSchedule> for Vec<(u64, usize)> {
    fn from(schedule: ChangeSchedule) -> Self {
        schedule
            .intervals
            .into_iter()
            .map(|iv| (iv.start, iv.label_count))
            .collect()
    }
}
