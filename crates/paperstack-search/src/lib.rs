//! # paperstack-search
//!
//! TF-IDF similarity search for paperstack.
//!
//! This crate provides:
//! - Tokenization and TF-IDF vectorization of extracted document text
//! - Sparse cosine similarity
//! - A per-user [`SimilarityIndex`] powering semantic search and
//!   related-document recommendations
//!
//! The index is rebuilt from the database corpus on each request; user
//! libraries are small and this keeps the ranking trivially consistent
//! with the stored text.

pub mod similarity;
pub mod tfidf;

pub use similarity::{SimilarityHit, SimilarityIndex};
pub use tfidf::{cosine, tokenize, SparseVector, TfIdfVectorizer};
