use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::{index::IndexParams, stop_words::is_stop_word},
};

/// Stop-word filtering applied before n-grams are formed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopWords {
    #[default]
    English,
    None,
}

/// One document's weights, stored as parallel arrays sorted by column
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseRow {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Dot product of two rows, merging their sorted index lists
    pub fn dot(&self, other: &SparseRow) -> f64 {
        let (mut a, mut b) = (0, 0);
        let mut sum = 0.0;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Document-term weight matrix, one sparse row per corpus entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SparseMatrix {
    pub n_cols: usize,
    pub rows: Vec<SparseRow>,
}

impl SparseMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, i: usize) -> Option<&SparseRow> {
        self.rows.get(i)
    }

    /// Checks the structural invariants a deserialised matrix must satisfy
    pub fn validate(&self) -> Result<(), String> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.indices.len() != row.values.len() {
                return Err(format!("feature row {} has mismatched lengths", i));
            }
            if row.indices.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("feature row {} indices are not strictly increasing", i));
            }
            if row.indices.iter().any(|&c| c >= self.n_cols) {
                return Err(format!("feature row {} references a column out of range", i));
            }
            if row.values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(format!("feature row {} holds an invalid weight", i));
            }
        }
        Ok(())
    }
}

/// TF-IDF vectoriser over word unigrams and word pairs
///
/// Fitting learns a fixed vocabulary (term -> column, columns in alphabetical
/// term order) and a smoothed idf per column:
/// `idf = ln((1 + n) / (1 + df)) + 1`. Transformed rows are raw term counts
/// scaled by idf and then L2-normalised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TfidfVectorizer {
    pub params: IndexParams,
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and idf weights from `documents`
    pub fn fit(documents: &[&str], params: &IndexParams) -> AppResult<Self> {
        let n_docs = documents.len();
        if n_docs == 0 {
            return Err(AppError::EmptyCorpus);
        }

        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let counts = term_counts(doc, params);
            for (term, count) in counts {
                *total_freq.entry(term.clone()).or_default() += count;
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        let max_doc_count = params.max_doc_frequency_ratio * n_docs as f64;
        if max_doc_count < params.min_doc_frequency as f64 {
            return Err(AppError::InsufficientData(format!(
                "max document frequency ({:.1} documents) is below the minimum of {} for a corpus of {}",
                max_doc_count, params.min_doc_frequency, n_docs
            )));
        }

        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= params.min_doc_frequency && (*df as f64) <= max_doc_count)
            .collect();

        if kept.len() > params.max_vocabulary_size {
            // Most frequent terms across the corpus win; BTreeMap order breaks ties
            kept.sort_by(|(a, _), (b, _)| {
                total_freq[b].cmp(&total_freq[a]).then_with(|| a.cmp(b))
            });
            kept.truncate(params.max_vocabulary_size);
            kept.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        if kept.is_empty() {
            return Err(AppError::InsufficientData(format!(
                "no terms remain after pruning {} documents; lower the minimum document frequency or raise the maximum ratio",
                n_docs
            )));
        }

        let n = n_docs as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (column, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, column);
        }

        tracing::debug!(
            documents = n_docs,
            vocabulary = vocabulary.len(),
            "Fitted TF-IDF vocabulary"
        );

        Ok(Self {
            params: params.clone(),
            vocabulary,
            idf,
        })
    }

    /// Weights `documents` against the fitted vocabulary
    pub fn transform(&self, documents: &[&str]) -> SparseMatrix {
        let rows = documents.iter().map(|doc| self.transform_one(doc)).collect();
        SparseMatrix {
            n_cols: self.vocabulary.len(),
            rows,
        }
    }

    pub fn fit_transform(documents: &[&str], params: &IndexParams) -> AppResult<(Self, SparseMatrix)> {
        let vectorizer = Self::fit(documents, params)?;
        let features = vectorizer.transform(documents);
        Ok((vectorizer, features))
    }

    fn transform_one(&self, document: &str) -> SparseRow {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        for (term, count) in term_counts(document, &self.params) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *weights.entry(column).or_default() += count as f64 * self.idf[column];
            }
        }

        let mut row = SparseRow {
            indices: weights.keys().copied().collect(),
            values: weights.values().copied().collect(),
        };

        let norm = row.norm();
        if norm > 0.0 {
            for value in &mut row.values {
                *value /= norm;
            }
        }
        row
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Checks that vocabulary columns and idf weights line up
    pub fn validate(&self) -> Result<(), String> {
        let size = self.vocabulary.len();
        if self.idf.len() != size {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                size,
                self.idf.len()
            ));
        }
        let mut seen = vec![false; size];
        for &column in self.vocabulary.values() {
            if column >= size || std::mem::replace(&mut seen[column], true) {
                return Err(format!("vocabulary column {} is out of range or repeated", column));
            }
        }
        if self.idf.iter().any(|w| !w.is_finite() || *w < 1.0) {
            return Err("idf weights must be finite and at least 1".to_string());
        }
        Ok(())
    }
}

/// Splits text into lower-case word tokens of two or more characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Unigrams and word pairs after stop-word removal
pub fn analyze(text: &str, params: &IndexParams) -> Vec<String> {
    let words: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|w| params.stop_words == StopWords::None || !is_stop_word(w))
        .collect();

    let (min_n, max_n) = params.ngram_range;
    let mut terms = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n == 1 {
            terms.extend(words.iter().cloned());
        } else {
            terms.extend(words.windows(n).map(|w| w.join(" ")));
        }
    }
    terms
}

fn term_counts(text: &str, params: &IndexParams) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in analyze(text, params) {
        *counts.entry(term).or_default() += 1;
    }
    counts
}
