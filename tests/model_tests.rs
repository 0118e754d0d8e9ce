use std::path::PathBuf;

use reelmatch::services::{Corpus, IndexParams, SimilarityIndex};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sample_movies.csv")
}

fn sample_index() -> SimilarityIndex {
    let corpus = Corpus::load(sample_path()).unwrap();
    SimilarityIndex::build(corpus, &IndexParams::default()).unwrap()
}

fn top_titles(index: &SimilarityIndex, title: &str, top_n: usize) -> Vec<String> {
    index
        .query(title, top_n)
        .unwrap()
        .recommendations
        .into_iter()
        .map(|r| r.movie.title)
        .collect()
}

#[test]
fn test_sample_corpus_drops_incomplete_row() {
    let corpus = Corpus::load(sample_path()).unwrap();
    assert_eq!(corpus.len(), 21);
    assert!(!corpus.titles().contains(&"Unfinished Entry".to_string()));
}

#[test]
fn test_sequels_are_near_neighbours() {
    let index = sample_index();
    assert!(top_titles(&index, "Dune", 3).contains(&"Dune: Part Two".to_string()));
    assert!(top_titles(&index, "Alien", 3).contains(&"Aliens".to_string()));
    assert!(top_titles(&index, "Blade Runner", 3).contains(&"Blade Runner 2049".to_string()));
}

#[test]
fn test_every_title_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let index = sample_index();
    index.save_to_path(&path).unwrap();
    let loaded = SimilarityIndex::load_from_path(&path).unwrap();

    assert_eq!(loaded.list_titles(), index.list_titles());
    for title in index.list_titles() {
        for top_n in [1, 5, 20] {
            assert_eq!(loaded.query(&title, top_n).unwrap(), index.query(&title, top_n).unwrap());
        }
    }
}
