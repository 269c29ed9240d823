use std::sync::Arc;

use chroma_memory::{ChangeSchedule, EpisodeStore, LabelIndex, LabelNeighborGraph};
use chroma_runtime::{RetrievalConfig, RetrievalEngine};
use chroma_types::{Algorithm, Color, Tier};
use proptest::prelude::*;

fn arb_color() -> impl Strategy<Value = Color> {
    any::<(u8, u8, u8)>().prop_map(|(r, g, b)| Color::new(r, g, b))
}

fn arb_config() -> impl Strategy<Value = RetrievalConfig> {
    (
        prop::sample::select(Algorithm::ALL.to_vec()),
        1usize..30,
        0usize..6,
        any::<bool>(),
    )
        .prop_map(|(algorithm, num_labels, num_neighbors, always_use_neighbors)| RetrievalConfig {
            algorithm,
            num_labels,
            num_neighbors,
            always_use_neighbors,
        })
}

proptest! {
    #[test]
    fn heuristics_never_beat_brute_force(
        colors in prop::collection::vec(arb_color(), 0..60),
        target in arb_color(),
        config in arb_config(),
        record_labels in 1usize..30,
    ) {
        let labels = Arc::new(LabelIndex::bundled().unwrap());
        let schedule = ChangeSchedule::constant(record_labels).unwrap();
        let store = EpisodeStore::build_with_changes(&labels, &colors, &schedule).unwrap();
        let mut engine = RetrievalEngine::new(labels);

        let brute = engine
            .retrieve(&store, target, &RetrievalConfig { algorithm: Algorithm::BruteForce, ..config })
            .unwrap();
        let outcome = engine.retrieve(&store, target, &config).unwrap();

        prop_assert_eq!(outcome.answer.is_some(), !colors.is_empty());
        if let (Some(best), Some(answer)) = (brute.answer, outcome.answer) {
            prop_assert!(target.distance(&answer) >= target.distance(&best));
        }

        // Brute force keeps the earliest of equally close episodes.
        if let Some(min) = colors.iter().map(|c| target.distance(c)).min() {
            let first = colors.iter().position(|c| target.distance(c) == min).unwrap() as u64;
            prop_assert_eq!(brute.answer_timestamp, Some(first));
        }

        let summed: u64 = outcome.tiers.iter().map(|t| t.scanned).sum();
        prop_assert_eq!(outcome.total_episodes_scanned, summed);
        prop_assert_eq!(outcome.num_fallbacks as usize, outcome.tiers.len() - 1);
        // A tier finds nothing only when it scanned nothing, so no episode is
        // visited twice.
        prop_assert!(outcome.total_episodes_scanned <= colors.len() as u64);
        if outcome.tiers.iter().any(|t| t.tier == Tier::BruteForce) {
            prop_assert_eq!(outcome.tiers.last().map(|t| t.tier), Some(Tier::BruteForce));
        }
    }

    #[test]
    fn exact_tier_scans_exactly_the_target_label(
        colors in prop::collection::vec(arb_color(), 1..60),
        target in arb_color(),
        num_labels in 1usize..30,
    ) {
        let labels = Arc::new(LabelIndex::bundled().unwrap());
        let schedule = ChangeSchedule::constant(num_labels).unwrap();
        let store = EpisodeStore::build_with_changes(&labels, &colors, &schedule).unwrap();
        let mut engine = RetrievalEngine::new(Arc::clone(&labels));

        let config = RetrievalConfig {
            algorithm: Algorithm::ExactHeuristic,
            num_labels,
            num_neighbors: 0,
            always_use_neighbors: false,
        };
        let outcome = engine.retrieve(&store, target, &config).unwrap();
        let label = labels.classify(&target, num_labels).unwrap();

        prop_assert_eq!(outcome.target_label.as_deref(), Some(label));
        prop_assert_eq!(outcome.tiers[0].scanned, store.label_len(label) as u64);
        prop_assert_eq!(outcome.tiers[0].found, store.label_len(label) > 0);
    }

    #[test]
    fn neighbor_tier_finds_the_best_over_all_neighbor_labels(
        colors in prop::collection::vec(arb_color(), 1..80),
        target in arb_color(),
        num_labels in 2usize..30,
        num_neighbors in 1usize..6,
    ) {
        let labels = Arc::new(LabelIndex::bundled().unwrap());
        let schedule = ChangeSchedule::constant(num_labels).unwrap();
        let store = EpisodeStore::build_with_changes(&labels, &colors, &schedule).unwrap();
        let mut engine = RetrievalEngine::new(Arc::clone(&labels));

        let config = RetrievalConfig {
            algorithm: Algorithm::NeighborHeuristic,
            num_labels,
            num_neighbors,
            always_use_neighbors: true,
        };
        let outcome = engine.retrieve(&store, target, &config).unwrap();

        let label = labels.classify(&target, num_labels).unwrap();
        let graph = LabelNeighborGraph::build(&labels, num_labels, num_neighbors);
        let neighbors = graph.neighbors_of(label);
        let key = |timestamp: u64, color: &Color| (target.distance(color), timestamp);

        let in_neighbors: Vec<_> = store
            .query_all()
            .iter()
            .filter(|e| neighbors.contains(&e.label.as_str()))
            .collect();
        let neighbor_best = in_neighbors.iter().min_by_key(|e| key(e.timestamp, &e.color));
        let exact_best = store.query_by_label(label).min_by_key(|e| key(e.timestamp, &e.color));

        prop_assert_eq!(outcome.tiers[1].tier, Tier::Neighbor);
        prop_assert_eq!(outcome.tiers[1].scanned, in_neighbors.len() as u64);
        prop_assert_eq!(outcome.tiers[1].found, neighbor_best.is_some());

        let expected = exact_best
            .into_iter()
            .chain(neighbor_best.copied())
            .min_by_key(|e| key(e.timestamp, &e.color));
        if let Some(expected) = expected {
            prop_assert_eq!(outcome.answer_timestamp, Some(expected.timestamp));
            prop_assert_eq!(outcome.num_fallbacks, 1);
        }
    }
}
