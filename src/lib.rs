//! Content-based movie recommendations
//!
//! A corpus of movies is turned into TF-IDF vectors over their synopsis,
//! genre and title; every pair is compared once with cosine similarity and the
//! result is persisted so the serving process only has to load it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
