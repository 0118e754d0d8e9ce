use serde::{Deserialize, Serialize};

use crate::services::vectorizer::SparseMatrix;

/// Pairwise cosine similarity between corpus entries
///
/// Only the strict upper triangle is stored, row by row. The diagonal is
/// always 1 and `get(i, j) == get(j, i)` holds by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    upper: Vec<f64>,
}

impl SimilarityMatrix {
    /// Cosine of every pair of L2-normalised rows
    pub fn from_features(features: &SparseMatrix) -> Self {
        let n = features.n_rows();
        let mut upper = Vec::with_capacity(packed_len(n));
        for i in 0..n {
            for j in (i + 1)..n {
                let score = features.rows[i].dot(&features.rows[j]);
                upper.push(score.clamp(0.0, 1.0));
            }
        }
        Self { n, upper }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity of entries `i` and `j`; `None` when either is out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.n || j >= self.n {
            return None;
        }
        if i == j {
            return Some(1.0);
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.upper.get(self.offset(lo, hi)).copied()
    }

    /// Full row `i`, diagonal included
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        (i < self.n).then(|| (0..self.n).filter_map(|j| self.get(i, j)).collect())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.upper.len() != packed_len(self.n) {
            return Err(format!(
                "similarity matrix for {} entries needs {} values, found {}",
                self.n,
                packed_len(self.n),
                self.upper.len()
            ));
        }
        if self
            .upper
            .iter()
            .any(|s| !s.is_finite() || !(0.0..=1.0).contains(s))
        {
            return Err("similarity scores must be finite and within [0, 1]".to_string());
        }
        Ok(())
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }
}

fn packed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vectorizer::SparseRow;

    fn unit(indices: Vec<usize>, values: Vec<f64>) -> SparseRow {
        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        SparseRow {
            indices,
            values: values.into_iter().map(|v| v / norm).collect(),
        }
    }

    fn sample() -> SimilarityMatrix {
        SimilarityMatrix::from_features(&SparseMatrix {
            n_cols: 3,
            rows: vec![
                unit(vec![0, 1], vec![1.0, 1.0]),
                unit(vec![0], vec![1.0]),
                unit(vec![2], vec![1.0]),
                SparseRow::default(),
            ],
        })
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let m = sample();
        for i in 0..m.len() {
            assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..m.len() {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn test_cosine_values() {
        let m = sample();
        assert!((m.get(0, 1).unwrap() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert_eq!(m.get(1, 2), Some(0.0));
    }

    #[test]
    fn test_zero_vector_row() {
        let m = sample();
        assert_eq!(m.row(3), Some(vec![0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_out_of_range() {
        let m = sample();
        assert_eq!(m.get(0, 4), None);
        assert_eq!(m.row(9), None);
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let short = SimilarityMatrix { n: 3, upper: vec![0.5] };
        assert!(short.validate().is_err());

        let out_of_range = SimilarityMatrix { n: 2, upper: vec![1.5] };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_single_entry_matrix() {
        let m = SimilarityMatrix::from_features(&SparseMatrix {
            n_cols: 1,
            rows: vec![unit(vec![0], vec![2.0])],
        });
        assert!(m.validate().is_ok());
        assert_eq!(m.row(0), Some(vec![1.0]));
    }
}
