use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{MovieRecord, Recommendation, RecommendationSet},
    services::{
        corpus::Corpus,
        similarity::SimilarityMatrix,
        vectorizer::{SparseMatrix, StopWords, TfidfVectorizer},
    },
};

/// Version written into every model artifact; bumped on incompatible changes
pub const FORMAT_VERSION: u32 = 1;

/// Parameters controlling vocabulary learning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexParams {
    pub max_vocabulary_size: usize,
    pub stop_words: StopWords,
    /// Inclusive range of n-gram lengths
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in
    pub min_doc_frequency: usize,
    /// Terms in more than this share of documents are dropped
    pub max_doc_frequency_ratio: f64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            max_vocabulary_size: 5000,
            stop_words: StopWords::English,
            ngram_range: (1, 2),
            min_doc_frequency: 2,
            max_doc_frequency_ratio: 0.8,
        }
    }
}

/// A fully built, immutable similarity index over one corpus
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    vectorizer: TfidfVectorizer,
    features: SparseMatrix,
    similarity: SimilarityMatrix,
    corpus: Corpus,
    built_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ModelArtifactRef<'a> {
    format_version: u32,
    built_at: DateTime<Utc>,
    vectorizer: &'a TfidfVectorizer,
    features: &'a SparseMatrix,
    similarity: &'a SimilarityMatrix,
    corpus: &'a [MovieRecord],
}

/// On-disk model envelope
#[derive(Deserialize)]
struct ModelArtifact {
    format_version: u32,
    built_at: DateTime<Utc>,
    vectorizer: TfidfVectorizer,
    features: SparseMatrix,
    similarity: SimilarityMatrix,
    corpus: Vec<MovieRecord>,
}

impl SimilarityIndex {
    /// Fits the vectoriser on the corpus fingerprints and precomputes every
    /// pairwise similarity.
    pub fn build(corpus: Corpus, params: &IndexParams) -> AppResult<Self> {
        let started = Instant::now();

        if corpus.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        let fingerprints = corpus.fingerprints();
        let (vectorizer, features) = TfidfVectorizer::fit_transform(&fingerprints, params)?;
        let similarity = SimilarityMatrix::from_features(&features);

        tracing::info!(
            movies = corpus.len(),
            vocabulary = vectorizer.vocabulary_size(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built similarity index"
        );

        Ok(Self {
            vectorizer,
            features,
            similarity,
            corpus,
            built_at: Utc::now(),
        })
    }

    /// Index of the movie a title query resolves to
    ///
    /// An exact case-insensitive title match wins over a substring match. When
    /// several movies match, the earliest in corpus order is chosen.
    pub fn resolve_title(&self, query: &str) -> Option<usize> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let titles: Vec<String> = self.corpus.iter().map(|m| m.title.to_lowercase()).collect();
        titles
            .iter()
            .position(|t| *t == needle)
            .or_else(|| titles.iter().position(|t| t.contains(&needle)))
    }

    /// The `top_n` movies most similar to the one `title` resolves to
    pub fn query(&self, title: &str, top_n: usize) -> AppResult<RecommendationSet> {
        if top_n == 0 {
            return Err(AppError::InvalidInput(
                "top_n must be at least 1".to_string(),
            ));
        }

        let i = self
            .resolve_title(title)
            .ok_or_else(|| AppError::MovieNotFound(title.to_string()))?;
        let row = self
            .similarity
            .row(i)
            .ok_or_else(|| AppError::Internal(format!("similarity row {} missing", i)))?;

        let mut scored: Vec<(usize, f64)> = row
            .into_iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let recommendations = scored
            .into_iter()
            .take(top_n)
            .filter_map(|(j, score)| {
                self.corpus.get(j).map(|movie| Recommendation {
                    movie: movie.clone(),
                    similarity_score: round_score(score),
                })
            })
            .collect();

        let matched_title = self
            .corpus
            .get(i)
            .map(|m| m.title.clone())
            .unwrap_or_default();

        Ok(RecommendationSet {
            matched_title,
            recommendations,
        })
    }

    /// Titles in corpus order
    pub fn list_titles(&self) -> Vec<String> {
        self.corpus.titles()
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn params(&self) -> &IndexParams {
        &self.vectorizer.params
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn similarity(&self, i: usize, j: usize) -> Option<f64> {
        self.similarity.get(i, j)
    }

    /// Serialises the whole index into one versioned JSON artifact
    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let artifact = ModelArtifactRef {
            format_version: FORMAT_VERSION,
            built_at: self.built_at,
            vectorizer: &self.vectorizer,
            features: &self.features,
            similarity: &self.similarity,
            corpus: self.corpus.movies(),
        };
        serde_json::to_vec(&artifact)
            .map_err(|e| AppError::Internal(format!("Failed to serialize model: {}", e)))
    }

    /// Restores an index written by [`SimilarityIndex::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| AppError::CorruptModel(format!("unreadable artifact: {}", e)))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(AppError::CorruptModel(format!(
                "unsupported format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }

        let n = artifact.corpus.len();
        if artifact.features.n_rows() != n || artifact.similarity.len() != n {
            return Err(AppError::CorruptModel(format!(
                "corpus has {} movies but features have {} rows and similarity has {}",
                n,
                artifact.features.n_rows(),
                artifact.similarity.len()
            )));
        }
        if artifact.features.n_cols != artifact.vectorizer.vocabulary_size() {
            return Err(AppError::CorruptModel(format!(
                "features have {} columns but vocabulary has {} terms",
                artifact.features.n_cols,
                artifact.vectorizer.vocabulary_size()
            )));
        }
        if artifact
            .corpus
            .iter()
            .any(|m| m.title.trim().is_empty() || m.overview.trim().is_empty())
        {
            return Err(AppError::CorruptModel(
                "corpus contains a movie without title or overview".to_string(),
            ));
        }

        artifact
            .vectorizer
            .validate()
            .and_then(|_| artifact.features.validate())
            .and_then(|_| artifact.similarity.validate())
            .map_err(AppError::CorruptModel)?;

        Ok(Self {
            vectorizer: artifact.vectorizer,
            features: artifact.features,
            similarity: artifact.similarity,
            corpus: Corpus::from_records(artifact.corpus),
            built_at: artifact.built_at,
        })
    }

    /// Writes the artifact next to `path` and renames it into place
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = temp_path(path);
        fs::write(&tmp, &bytes).map_err(|e| {
            AppError::Internal(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppError::Internal(format!("Failed to move model into {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bytes = bytes.len(),
            "Saved model artifact"
        );
        Ok(())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ModelUnavailable(format!(
                "no model found at {}; run the train command first",
                path.display()
            )),
            _ => AppError::ModelUnavailable(format!("Failed to read {}: {}", path.display(), e)),
        })?;

        let index = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            movies = index.len(),
            vocabulary = index.vocabulary_size(),
            built_at = %index.built_at,
            "Loaded model artifact"
        );
        Ok(index)
    }
}

fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawMovieRow;

    fn scenario_corpus() -> Corpus {
        Corpus::build(vec![
            RawMovieRow::new(
                "Dune",
                "A young noble unites desert tribes to seize control of a powerful resource.",
                "Sci-Fi",
            ),
            RawMovieRow::new(
                "Dune: Part Two",
                "The hero continues his quest for revenge against the conspirators who destroyed his family.",
                "Sci-Fi",
            ),
            RawMovieRow::new(
                "The Notebook",
                "A poor boy falls in love with a rich girl in a story spanning decades.",
                "Romance",
            ),
        ])
    }

    fn larger_corpus() -> Corpus {
        Corpus::build(vec![
            RawMovieRow::new("Alien", "A space crew is hunted by a deadly alien creature aboard their ship.", "Sci-Fi Horror"),
            RawMovieRow::new("Aliens", "Marines return to the colony to fight the alien creature and its hive.", "Sci-Fi Action"),
            RawMovieRow::new("Heat", "A detective hunts a crew of professional thieves across the city.", "Crime Thriller"),
            RawMovieRow::new("The Departed", "An undercover cop and a mole in the police hunt each other in the city.", "Crime Thriller"),
            RawMovieRow::new("Interstellar", "Explorers travel through a wormhole in space to save humanity.", "Sci-Fi Drama"),
            RawMovieRow::new("Gravity", "Two astronauts are stranded in space after their ship is destroyed.", "Sci-Fi Thriller"),
            RawMovieRow::new("Notting Hill", "A bookshop owner falls in love with a famous actress.", "Romance Comedy"),
            RawMovieRow::new("Before Sunrise", "Two strangers fall in love during one night in Vienna.", "Romance Drama"),
        ])
    }

    fn build(corpus: Corpus) -> SimilarityIndex {
        SimilarityIndex::build(corpus, &IndexParams::default()).unwrap()
    }

    fn ranked(set: &RecommendationSet) -> Vec<(String, f64)> {
        set.recommendations
            .iter()
            .map(|r| (r.movie.title.clone(), r.similarity_score))
            .collect()
    }

    #[test]
    fn test_sequel_ranks_above_unrelated_romance() {
        let index = build(scenario_corpus());
        let set = index.query("Dune", 2).unwrap();
        assert_eq!(set.matched_title, "Dune");

        let results = ranked(&set);
        assert_eq!(results[0].0, "Dune: Part Two");
        assert_eq!(results[1].0, "The Notebook");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_lowercase_query_matches_exact_title() {
        let index = build(scenario_corpus());
        let upper = index.query("Dune", 2).unwrap();
        let lower = index.query("dune", 2).unwrap();
        assert_eq!(lower.matched_title, "Dune");
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_substring_match() {
        let index = build(scenario_corpus());
        let set = index.query("part two", 2).unwrap();
        assert_eq!(set.matched_title, "Dune: Part Two");
    }

    #[test]
    fn test_first_match_in_corpus_order_wins() {
        let index = build(larger_corpus());
        // "alien" is an exact match for "Alien" even though "Aliens" also contains it
        assert_eq!(index.resolve_title("ALIEN"), Some(0));
        // Interstellar comes before Notting Hill and Before Sunrise
        assert_eq!(index.resolve_title("in"), Some(4));
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let index = build(scenario_corpus());
        let result = index.query("nonexistent movie xyz", 5);
        assert!(matches!(result, Err(AppError::MovieNotFound(_))));
        assert!(matches!(index.query("   ", 5), Err(AppError::MovieNotFound(_))));
    }

    #[test]
    fn test_zero_top_n_is_rejected() {
        let index = build(scenario_corpus());
        assert!(matches!(index.query("Dune", 0), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_query_never_returns_itself() {
        let index = build(larger_corpus());
        for title in index.list_titles() {
            let set = index.query(&title, 10).unwrap();
            assert!(set.recommendations.iter().all(|r| r.movie.title != title));
        }
    }

    #[test]
    fn test_result_count_is_bounded() {
        let index = build(larger_corpus());
        assert_eq!(index.query("Heat", 5).unwrap().recommendations.len(), 5);
        assert_eq!(index.query("Heat", 50).unwrap().recommendations.len(), 7);

        let small = build(scenario_corpus());
        assert_eq!(small.query("Dune", 5).unwrap().recommendations.len(), 2);
    }

    #[test]
    fn test_results_sorted_descending_with_index_tie_break() {
        let index = build(larger_corpus());
        for title in index.list_titles() {
            let set = index.query(&title, 7).unwrap();
            let scores: Vec<f64> = set.recommendations.iter().map(|r| r.similarity_score).collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_similarity_is_symmetric_with_unit_diagonal() {
        let index = build(larger_corpus());
        for i in 0..index.len() {
            assert!((index.similarity(i, i).unwrap() - 1.0).abs() < 1e-9);
            for j in 0..index.len() {
                assert_eq!(index.similarity(i, j), index.similarity(j, i));
            }
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build(larger_corpus());
        let b = build(larger_corpus());
        for title in a.list_titles() {
            assert_eq!(a.query(&title, 5).unwrap(), b.query(&title, 5).unwrap());
        }
    }

    #[test]
    fn test_scores_are_rounded_to_three_places() {
        let index = build(larger_corpus());
        let set = index.query("Alien", 7).unwrap();
        for r in set.recommendations {
            let scaled = r.similarity_score * 1000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_corpus_fails() {
        let result = SimilarityIndex::build(Corpus::default(), &IndexParams::default());
        assert!(matches!(result, Err(AppError::EmptyCorpus)));
    }

    #[test]
    fn test_sparse_corpus_is_insufficient() {
        let corpus = Corpus::build(vec![
            RawMovieRow::new("Heat", "Cops and robbers.", "Crime"),
            RawMovieRow::new("Alien", "Monster aboard a ship.", "Horror"),
            RawMovieRow::new("Up", "Balloons lift a house.", "Animation"),
        ]);
        let result = SimilarityIndex::build(corpus, &IndexParams::default());
        assert!(matches!(result, Err(AppError::InsufficientData(_))));
    }

    #[test]
    fn test_dropped_row_never_recommended() {
        let mut rows = vec![RawMovieRow::new("Ghost Movie", "", "Sci-Fi")];
        rows.extend(larger_corpus().movies().iter().map(|m| {
            RawMovieRow::new(&m.title, &m.overview, &m.genre)
        }));
        let corpus = Corpus::build(rows);
        assert_eq!(corpus.len(), 8);

        let index = build(corpus);
        for title in index.list_titles() {
            let set = index.query(&title, 10).unwrap();
            assert!(set.recommendations.iter().all(|r| r.movie.title != "Ghost Movie"));
        }
    }

    #[test]
    fn test_round_trip_preserves_queries() {
        let index = build(larger_corpus());
        let restored = SimilarityIndex::from_bytes(&index.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.built_at(), index.built_at());
        assert_eq!(restored.params(), index.params());
        assert_eq!(restored.corpus(), index.corpus());
        for title in index.list_titles() {
            for top_n in [1, 3, 5, 10] {
                assert_eq!(
                    restored.query(&title, top_n).unwrap(),
                    index.query(&title, top_n).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("model.json");

        let index = build(scenario_corpus());
        index.save_to_path(&path).unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = SimilarityIndex::load_from_path(&path).unwrap();
        assert_eq!(loaded.list_titles(), index.list_titles());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = SimilarityIndex::load_from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(AppError::ModelUnavailable(_))));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let result = SimilarityIndex::from_bytes(b"not a model");
        assert!(matches!(result, Err(AppError::CorruptModel(_))));
    }

    #[test]
    fn test_wrong_version_is_corrupt() {
        let index = build(scenario_corpus());
        let mut value: serde_json::Value = serde_json::from_slice(&index.to_bytes().unwrap()).unwrap();
        value["format_version"] = serde_json::json!(99);
        let result = SimilarityIndex::from_bytes(&serde_json::to_vec(&value).unwrap());
        assert!(matches!(result, Err(AppError::CorruptModel(msg)) if msg.contains("version")));
    }

    #[test]
    fn test_missing_part_is_corrupt() {
        let index = build(scenario_corpus());
        let mut value: serde_json::Value = serde_json::from_slice(&index.to_bytes().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("similarity");
        let result = SimilarityIndex::from_bytes(&serde_json::to_vec(&value).unwrap());
        assert!(matches!(result, Err(AppError::CorruptModel(_))));
    }

    #[test]
    fn test_dimension_mismatch_is_corrupt() {
        let index = build(scenario_corpus());
        let mut value: serde_json::Value = serde_json::from_slice(&index.to_bytes().unwrap()).unwrap();
        value["corpus"].as_array_mut().unwrap().pop();
        let result = SimilarityIndex::from_bytes(&serde_json::to_vec(&value).unwrap());
        assert!(matches!(result, Err(AppError::CorruptModel(_))));
    }
}
