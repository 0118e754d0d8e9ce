use serde::{Deserialize, Serialize, Serializer};

/// One row of the corpus CSV as it was read, before any validation
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawMovieRow {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl RawMovieRow {
    pub fn new(title: &str, overview: &str, genre: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            overview: Some(overview.to_string()),
            genre: Some(genre.to_string()),
            rating: None,
            year: None,
        }
    }
}

/// A validated movie in the corpus
///
/// The fingerprint is derived from `title`, `genre` and `overview` and is never
/// written out on its own; deserialised records come back with an empty
/// fingerprint until the corpus recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub overview: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(skip)]
    pub fingerprint: String,
}

impl MovieRecord {
    pub fn new(title: impl Into<String>, overview: impl Into<String>, genre: impl Into<String>) -> Self {
        let mut record = Self {
            title: title.into(),
            overview: overview.into(),
            genre: genre.into(),
            rating: None,
            year: None,
            fingerprint: String::new(),
        };
        record.refresh_fingerprint();
        record
    }

    /// Recomputes the fingerprint from the source fields
    pub fn refresh_fingerprint(&mut self) {
        self.fingerprint = fingerprint(&self.title, &self.genre, &self.overview);
    }
}

/// Normalised text used for similarity: overview, genre and title joined,
/// lower-cased, with everything except ASCII letters and whitespace removed.
///
/// Digits and non-ASCII letters are dropped as well ("Amélie" becomes "amlie",
/// "2001" disappears). Existing models depend on this, so it is kept as is.
pub fn fingerprint(title: &str, genre: &str, overview: &str) -> String {
    format!("{} {} {}", overview, genre, title)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect()
}

/// Serialises an optional number as the number itself or the string `"N/A"`
pub fn serialize_or_na<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str("N/A"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_order_and_case() {
        assert_eq!(
            fingerprint("Dune", "Sci-Fi", "A young noble."),
            "a young noble scifi dune"
        );
    }

    #[test]
    fn test_fingerprint_drops_digits_and_accents() {
        // Lossy: numerals and accented letters vanish from the fingerprint
        assert_eq!(fingerprint("2001", "", ""), "  ");
        assert_eq!(fingerprint("Amélie", "Romance", "Paris"), "paris romance amlie");
        assert_eq!(fingerprint("Blade Runner 2049", "", "x"), "x  blade runner ");
    }

    #[test]
    fn test_new_record_has_fingerprint() {
        let movie = MovieRecord::new("Alien", "In space no one can hear you scream.", "Horror");
        assert_eq!(
            movie.fingerprint,
            "in space no one can hear you scream horror alien"
        );
    }

    #[test]
    fn test_fingerprint_is_not_serialized() {
        let movie = MovieRecord::new("Alien", "Crew meets creature.", "Horror");
        let json = serde_json::to_value(&movie).unwrap();
        assert!(json.get("fingerprint").is_none());

        let mut restored: MovieRecord = serde_json::from_value(json).unwrap();
        assert!(restored.fingerprint.is_empty());
        restored.refresh_fingerprint();
        assert_eq!(restored, movie);
    }

    #[test]
    fn test_serialize_or_na() {
        #[derive(Serialize)]
        struct Row {
            #[serde(serialize_with = "serialize_or_na")]
            rating: Option<f64>,
            #[serde(serialize_with = "serialize_or_na")]
            year: Option<i32>,
        }

        let json = serde_json::to_value(Row {
            rating: Some(7.5),
            year: None,
        })
        .unwrap();
        assert_eq!(json["rating"], 7.5);
        assert_eq!(json["year"], "N/A");
    }
}
