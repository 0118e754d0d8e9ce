pub mod corpus;
pub mod index;
pub mod providers;
pub mod recommender;
pub mod similarity;
pub mod stop_words;
pub mod vectorizer;

pub use corpus::Corpus;
pub use index::{IndexParams, SimilarityIndex};
pub use providers::{MetadataProvider, TmdbProvider};
pub use recommender::{ModelState, ModelStatus, RecommendationLimits, Recommender};
