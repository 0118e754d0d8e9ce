use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{MovieRecord, RawMovieRow},
};

const REQUIRED_COLUMNS: [&str; 2] = ["title", "overview"];

/// Ordered collection of movies; position `i` is row/column `i` of every matrix
/// built from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    movies: Vec<MovieRecord>,
}

impl Corpus {
    /// Builds a corpus from raw rows, silently dropping rows without a title or
    /// overview. Surviving rows keep their input order.
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RawMovieRow>,
    {
        let mut dropped = 0usize;
        let movies: Vec<MovieRecord> = rows
            .into_iter()
            .filter_map(|row| {
                let record = into_record(row);
                if record.is_none() {
                    dropped += 1;
                }
                record
            })
            .collect();

        tracing::debug!(movies = movies.len(), dropped, "Corpus built");

        Self { movies }
    }

    /// Reads a CSV corpus from disk
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AppError::DataLoad(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let corpus = Self::from_reader(file)?;

        tracing::info!(
            path = %path.display(),
            movies = corpus.len(),
            "Loaded movie corpus"
        );

        Ok(corpus)
    }

    /// Reads a CSV corpus with a header row containing at least `title` and
    /// `overview`. Unknown columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| AppError::DataLoad(format!("Failed to read CSV header: {}", e)))?
            .clone();

        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(AppError::DataLoad(format!(
                    "Missing required column '{}' (found: {})",
                    column,
                    headers.iter().collect::<Vec<_>>().join(", ")
                )));
            }
        }

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let malformed = |e: &dyn std::fmt::Display| {
                AppError::DataLoad(format!("Malformed CSV row {}: {}", line + 2, e))
            };

            let mut record = result.map_err(|e| malformed(&e))?;

            // Short rows leave trailing columns empty; long rows are rejected
            if record.len() > headers.len() {
                return Err(malformed(&format!(
                    "found {} fields, but the header has {}",
                    record.len(),
                    headers.len()
                )));
            }
            while record.len() < headers.len() {
                record.push_field("");
            }

            let row: RawMovieRow = record
                .deserialize(Some(&headers))
                .map_err(|e| malformed(&e))?;
            rows.push(row);
        }

        Ok(Self::build(rows))
    }

    /// Wraps already validated records, recomputing their fingerprints
    pub fn from_records(mut movies: Vec<MovieRecord>) -> Self {
        for movie in &mut movies {
            movie.refresh_fingerprint();
        }
        Self { movies }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MovieRecord> {
        self.movies.iter()
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// Titles in corpus order
    pub fn titles(&self) -> Vec<String> {
        self.movies.iter().map(|m| m.title.clone()).collect()
    }

    pub fn fingerprints(&self) -> Vec<&str> {
        self.movies.iter().map(|m| m.fingerprint.as_str()).collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn into_record(row: RawMovieRow) -> Option<MovieRecord> {
    let title = non_blank(row.title)?;
    let overview = non_blank(row.overview)?;

    let mut record = MovieRecord::new(title, overview, row.genre.unwrap_or_default());
    record.rating = row.rating.as_deref().and_then(parse_number);
    record.year = row
        .year
        .as_deref()
        .and_then(parse_number)
        .and_then(parse_year);

    Some(record)
}

/// Parses numeric cells, treating blanks and markers such as "N/A" as missing
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Truncates a numeric year, treating values outside the `i32` range as missing
fn parse_year(value: f64) -> Option<i32> {
    let year = value.trunc();
    if year < f64::from(i32::MIN) || year > f64::from(i32::MAX) {
        return None;
    }
    i32::try_from(year as i64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
title,overview,genre,rating,year
Dune,\"A young noble unites desert tribes to seize control of a powerful resource.\",Sci-Fi,8.0,2021
Dune: Part Two,The hero continues his quest for revenge against the conspirators who destroyed his family.,Sci-Fi,8.6,2024.0
The Notebook,\"A poor boy falls in love with a rich girl in a story spanning decades.\",Romance,N/A,
";

    #[test]
    fn test_from_reader_parses_rows_in_order() {
        let corpus = Corpus::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.titles(), vec!["Dune", "Dune: Part Two", "The Notebook"]);

        let dune = corpus.get(0).unwrap();
        assert_eq!(dune.rating, Some(8.0));
        assert_eq!(dune.year, Some(2021));
        assert_eq!(corpus.get(1).unwrap().year, Some(2024));

        let notebook = corpus.get(2).unwrap();
        assert_eq!(notebook.rating, None);
        assert_eq!(notebook.year, None);
        assert_eq!(notebook.genre, "Romance");
    }

    #[test]
    fn test_rows_with_empty_overview_are_dropped() {
        let csv = "title,overview,genre\nDune,Desert planet.,Sci-Fi\nAlien,,Horror\nHeat,Cops and robbers.,Crime\n";
        let corpus = Corpus::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(!corpus.titles().contains(&"Alien".to_string()));
    }

    #[test]
    fn test_rows_without_title_are_dropped() {
        let rows = vec![
            RawMovieRow::new("Dune", "Desert planet.", "Sci-Fi"),
            RawMovieRow {
                title: None,
                overview: Some("Orphaned overview.".to_string()),
                ..Default::default()
            },
            RawMovieRow::new("   ", "Blank title.", "Drama"),
        ];
        let corpus = Corpus::build(rows);
        assert_eq!(corpus.titles(), vec!["Dune"]);
    }

    #[test]
    fn test_missing_genre_defaults_to_empty() {
        let csv = "title,overview\nHeat,Cops and robbers.\n";
        let corpus = Corpus::from_reader(csv.as_bytes()).unwrap();
        let heat = corpus.get(0).unwrap();
        assert_eq!(heat.genre, "");
        assert_eq!(heat.fingerprint, "cops and robbers  heat");
    }

    #[test]
    fn test_empty_input_yields_empty_corpus() {
        let corpus = Corpus::from_reader("title,overview,genre\n".as_bytes()).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_missing_required_column_is_data_load_error() {
        let result = Corpus::from_reader("name,overview\nDune,Desert.\n".as_bytes());
        assert!(matches!(result, Err(AppError::DataLoad(msg)) if msg.contains("title")));
    }

    #[test]
    fn test_ragged_row_is_data_load_error() {
        let csv = "title,overview,genre\nDune,Desert planet.,Sci-Fi,extra,cells\n";
        let result = Corpus::from_reader(csv.as_bytes());
        assert!(matches!(result, Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_short_rows_fill_missing_columns() {
        let csv = "title,overview,genre,rating,year\n\
                   Dune,Desert planet.,Sci-Fi,8.0,2021\n\
                   Heat,Cops and robbers.\n\
                   Alien\n";
        let corpus = Corpus::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(corpus.titles(), vec!["Dune", "Heat"]);

        let heat = corpus.get(1).unwrap();
        assert_eq!(heat.genre, "");
        assert_eq!(heat.rating, None);
        assert_eq!(heat.year, None);
    }

    #[test]
    fn test_short_rows_skip_unknown_trailing_columns() {
        let csv = "title,overview,director\nHeat,Cops and robbers.\n";
        let corpus = Corpus::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(corpus.titles(), vec!["Heat"]);
    }

    #[test]
    fn test_out_of_range_year_is_missing() {
        let csv = "title,overview,year\nHeat,Cops and robbers.,1e12\nDune,Desert planet.,-1e12\n";
        let corpus = Corpus::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(corpus.get(0).unwrap().year, None);
        assert_eq!(corpus.get(1).unwrap().year, None);
        assert_eq!(parse_year(1995.9), Some(1995));
    }

    #[test]
    fn test_load_missing_file_is_data_load_error() {
        let result = Corpus::load("/definitely/not/here/movies.csv");
        assert!(matches!(result, Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();

        let corpus = Corpus::load(&path).unwrap();
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn test_from_records_recomputes_fingerprints() {
        let mut movie = MovieRecord::new("Heat", "Cops and robbers.", "Crime");
        movie.fingerprint.clear();
        let corpus = Corpus::from_records(vec![movie]);
        assert_eq!(corpus.fingerprints(), vec!["cops and robbers crime heat"]);
    }
}
