//! Seeded color sequence generators.
//!
//! Every trial owns a [`ColorSource`] built from an explicit `u64` seed, so a
//! sequence can be regenerated bit-for-bit on any platform.  There is no
//! process-wide RNG.
//!
//! | Kind | Description |
//! |---|---|
//! | [`SequenceKind::Random`] | i.i.d. uniform RGB colors |
//! | [`SequenceKind::Walk`] | bounded random walk: each step perturbs one channel by at most [`DEFAULT_MAX_STEP`] |
//!
//! # Example
//!
//! ```rust
//! use chroma_runtime::source::{SequenceKind, generate};
//!
//! let a = generate(SequenceKind::Walk, 100, 7);
//! let b = generate(SequenceKind::Walk, 100, 7);
//! assert_eq!(a, b);
//! ```

use chroma_types::Color;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Largest per-step channel change of a random walk.
pub const DEFAULT_MAX_STEP: u8 = 8;

/// Which kind of color stream a trial records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
    #[default]
    Random,
    Walk,
}

// ─────────────────────────────────────────────────────────────────────────────
// ColorSource
// ─────────────────────────────────────────────────────────────────────────────

/// Deterministic color generator.
#[derive(Debug, Clone)]
pub struct ColorSource {
    rng: ChaCha20Rng,
    seed: u64,
}

impl ColorSource {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha20Rng::seed_from_u64(seed), seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One uniformly random color.
    pub fn random_color(&mut self) -> Color {
        Color::new(self.rng.random(), self.rng.random(), self.rng.random())
    }

    pub fn random_colors(&mut self, count: usize) -> Vec<Color> {
        (0..count).map(|_| self.random_color()).collect()
    }

    /// Perturb one randomly chosen channel by a delta in
    /// `[-max_step, max_step]`, redrawing the delta until the channel stays
    /// inside `0..=255`.
    pub fn step(&mut self, color: Color, max_step: u8) -> Color {
        let mut channels = [color.r, color.g, color.b];
        let channel = self.rng.random_range(0..3);
        let bound = i16::from(max_step);
        let current = i16::from(channels[channel]);
        let moved = loop {
            let candidate = current + self.rng.random_range(-bound..=bound);
            if (0..=255).contains(&candidate) {
                break candidate;
            }
        };
        channels[channel] = moved as u8;
        Color::new(channels[0], channels[1], channels[2])
    }

    /// A walk of `count` colors starting from a uniformly random color.
    pub fn random_walk(&mut self, count: usize, max_step: u8) -> Vec<Color> {
        if count == 0 {
            return Vec::new();
        }
        let start = self.random_color();
        self.walk_from(start, count, max_step)
    }

    /// A walk of `count` colors whose first element is `start`.
    pub fn walk_from(&mut self, start: Color, count: usize, max_step: u8) -> Vec<Color> {
        let mut colors = Vec::with_capacity(count);
        let mut current = start;
        for _ in 0..count {
            colors.push(current);
            current = self.step(current, max_step);
        }
        colors
    }

    pub fn generate(&mut self, kind: SequenceKind, count: usize) -> Vec<Color> {
        match kind {
            SequenceKind::Random => self.random_colors(count),
            SequenceKind::Walk => self.random_walk(count, DEFAULT_MAX_STEP),
        }
    }
}

/// Generate `count` colors of `kind` from a fresh source seeded with `seed`.
pub fn generate(kind: SequenceKind, count: usize, seed: u64) -> Vec<Color> {
    ColorSource::new(seed).generate(kind, count)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        for kind in [SequenceKind::Random, SequenceKind::Walk] {
            assert_eq!(generate(kind, 64, 42), generate(kind, 64, 42));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        assert_ne!(
            generate(SequenceKind::Random, 64, 1),
            generate(SequenceKind::Random, 64, 2)
        );
    }

    #[test]
    fn requested_length_is_honoured() {
        assert!(generate(SequenceKind::Walk, 0, 3).is_empty());
        assert_eq!(generate(SequenceKind::Walk, 1, 3).len(), 1);
        assert_eq!(generate(SequenceKind::Random, 250, 3).len(), 250);
    }

    #[test]
    fn walk_steps_change_one_channel_within_bound() {
        let walk = generate(SequenceKind::Walk, 2_000, 99);
        for pair in walk.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let changed = [a.r != b.r, a.g != b.g, a.b != b.b].iter().filter(|c| **c).count();
            assert!(changed <= 1, "{a} -> {b}");
            assert!(a.distance(&b) <= u16::from(DEFAULT_MAX_STEP), "{a} -> {b}");
        }
    }

    #[test]
    fn walk_stays_in_range_at_the_corners() {
        let mut source = ColorSource::new(5);
        let walk = source.walk_from(Color::BLACK, 500, 200);
        assert_eq!(walk[0], Color::BLACK);
        // Every step is bounded even when most deltas would leave the cube.
        for pair in walk.windows(2) {
            assert!(pair[0].distance(&pair[1]) <= 200);
        }
    }

    #[test]
    fn zero_step_walk_is_constant() {
        let mut source = ColorSource::new(11);
        let start = Color::new(10, 20, 30);
        assert!(source.walk_from(start, 20, 0).iter().all(|c| *c == start));
    }

    #[test]
    fn sequence_kind_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&SequenceKind::Walk).unwrap(), "\"walk\"");
        let kind: SequenceKind = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(kind, SequenceKind::Random);
    }
}
