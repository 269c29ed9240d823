use std::sync::Arc;

use chroma_memory::{ChangeSchedule, EpisodeStore, LabelIndex, SqliteEpisodeStore};
use chroma_runtime::{RetrievalConfig, RetrievalEngine};
use chroma_types::{Algorithm, Color, Tier};

fn hex(s: &str) -> Color {
    Color::from_hex(s).unwrap()
}

fn black_white_red() -> Arc<LabelIndex> {
    Arc::new(LabelIndex::from_tsv("3\tblack\t#000000\n2\twhite\t#FFFFFF\n1\tred\t#FF0000\n", 0).unwrap())
}

#[test]
fn exact_heuristic_finds_red_in_one_scan() {
    let labels = black_white_red();
    let colors = [hex("#000000"), hex("#FFFFFF"), hex("#FF0000")];
    let store = EpisodeStore::build_with_changes(&labels, &colors, &ChangeSchedule::constant(3).unwrap()).unwrap();
    let mut engine = RetrievalEngine::new(labels);

    let config = RetrievalConfig {
        algorithm: Algorithm::ExactHeuristic,
        num_labels: 3,
        num_neighbors: 0,
        always_use_neighbors: false,
    };
    let outcome = engine.retrieve(&store, hex("#FE0000"), &config).unwrap();

    assert_eq!(outcome.answer, Some(hex("#FF0000")));
    assert_eq!(outcome.answer_timestamp, Some(2));
    assert_eq!(outcome.total_episodes_scanned, 1);
    assert_eq!(outcome.num_fallbacks, 0);
}

#[test]
fn empty_sequence_under_brute_force() {
    let labels = black_white_red();
    let store = EpisodeStore::build_with_changes(&labels, &[], &ChangeSchedule::constant(3).unwrap()).unwrap();
    let mut engine = RetrievalEngine::new(labels);

    let config = RetrievalConfig { algorithm: Algorithm::BruteForce, ..RetrievalConfig::default() };
    let outcome = engine.retrieve(&store, hex("#123456"), &config).unwrap();

    assert_eq!(outcome.answer, None);
    assert_eq!(outcome.total_episodes_scanned, 0);
    assert_eq!(outcome.num_fallbacks, 0);
    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["answer"].is_null());
}

#[test]
fn always_use_neighbors_counts_both_tiers() {
    let labels = black_white_red();
    let colors = [hex("#000000"), hex("#FFFFFF"), hex("#FF0000"), hex("#EE1111")];
    let memory =
        EpisodeStore::build_with_changes(&labels, &colors, &ChangeSchedule::constant(3).unwrap()).unwrap();
    let sqlite = SqliteEpisodeStore::from_store(&memory).unwrap();
    let mut engine = RetrievalEngine::new(labels);

    let config = RetrievalConfig {
        algorithm: Algorithm::NeighborHeuristic,
        num_labels: 3,
        num_neighbors: 1,
        always_use_neighbors: true,
    };
    for outcome in [
        engine.retrieve(&memory, hex("#FE0000"), &config).unwrap(),
        engine.retrieve(&sqlite, hex("#FE0000"), &config).unwrap(),
    ] {
        let tiers: Vec<Tier> = outcome.tiers.iter().map(|t| t.tier).collect();
        assert_eq!(tiers, vec![Tier::Exact, Tier::Neighbor]);
        assert_eq!(outcome.num_fallbacks, 1);
        // Two reds, then red's nearest neighbor (black) with one episode.
        assert_eq!(outcome.total_episodes_scanned, 3);
        assert_eq!(outcome.answer, Some(hex("#FF0000")));
    }
}
