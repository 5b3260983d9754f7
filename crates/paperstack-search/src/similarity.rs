//! Per-user similarity index over extracted document text.

use tracing::debug;
use uuid::Uuid;

use paperstack_core::defaults::SIMILARITY_FLOOR;

use crate::tfidf::{cosine, tokenize, SparseVector, TfIdfVectorizer};

/// One ranked result from the similarity index.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub document_id: Uuid,
    pub score: f32,
}

/// TF-IDF index over one user's documents with extracted text.
///
/// Built per request from the corpus the database hands back; documents
/// without text simply never enter the index.
pub struct SimilarityIndex {
    vectorizer: TfIdfVectorizer,
    ids: Vec<Uuid>,
    vectors: Vec<SparseVector>,
}

impl SimilarityIndex {
    /// Build the index from (document id, extracted text) pairs.
    pub fn build(corpus: &[(Uuid, String)]) -> Self {
        let tokenized: Vec<Vec<String>> =
            corpus.iter().map(|(_, text)| tokenize(text)).collect();
        let vectorizer = TfIdfVectorizer::fit(&tokenized);
        let vectors = tokenized
            .iter()
            .map(|tokens| vectorizer.transform(tokens))
            .collect();

        debug!(
            subsystem = "search",
            component = "tfidf",
            document_count = corpus.len(),
            vocab_size = vectorizer.vocab_size(),
            "Built similarity index"
        );

        Self {
            vectorizer,
            ids: corpus.iter().map(|(id, _)| *id).collect(),
            vectors,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Documents most similar to the given one, excluding itself.
    ///
    /// Returns an empty list when the document is not in the index
    /// (no extracted text).
    pub fn related(&self, document_id: Uuid, k: usize) -> Vec<SimilarityHit> {
        let Some(pos) = self.ids.iter().position(|&id| id == document_id) else {
            return Vec::new();
        };
        self.rank(&self.vectors[pos], k, Some(pos))
    }

    /// Documents ranked against a free-text query.
    pub fn search(&self, query: &str, k: usize) -> Vec<SimilarityHit> {
        let vector = self.vectorizer.transform(&tokenize(query));
        if vector.is_empty() {
            return Vec::new();
        }
        self.rank(&vector, k, None)
    }

    fn rank(&self, target: &SparseVector, k: usize, exclude: Option<usize>) -> Vec<SimilarityHit> {
        let mut hits: Vec<SimilarityHit> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != exclude)
            .map(|(i, v)| SimilarityHit {
                document_id: self.ids[i],
                score: cosine(target, v),
            })
            .filter(|hit| hit.score >= SIMILARITY_FLOOR)
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<(Uuid, String)> {
        vec![
            (
                Uuid::now_v7(),
                "calculus derivatives integrals limits continuity".to_string(),
            ),
            (
                Uuid::now_v7(),
                "calculus integrals substitution integration techniques".to_string(),
            ),
            (
                Uuid::now_v7(),
                "organic chemistry reactions benzene aromatic compounds".to_string(),
            ),
        ]
    }

    #[test]
    fn test_related_prefers_same_topic() {
        let docs = corpus();
        let index = SimilarityIndex::build(&docs);

        let hits = index.related(docs[0].0, 10);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].document_id, docs[1].0);
        // A document never matches itself.
        assert!(hits.iter().all(|h| h.document_id != docs[0].0));
    }

    #[test]
    fn test_related_unknown_document_is_empty() {
        let index = SimilarityIndex::build(&corpus());
        assert!(index.related(Uuid::now_v7(), 10).is_empty());
    }

    #[test]
    fn test_search_ranks_by_query() {
        let docs = corpus();
        let index = SimilarityIndex::build(&docs);

        let hits = index.search("benzene aromatic", 10);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].document_id, docs[2].0);
    }

    #[test]
    fn test_search_unknown_terms_is_empty() {
        let index = SimilarityIndex::build(&corpus());
        assert!(index.search("zzz qqq", 10).is_empty());
    }

    #[test]
    fn test_low_scores_filtered() {
        let docs = corpus();
        let index = SimilarityIndex::build(&docs);
        for hit in index.search("calculus", 10) {
            assert!(hit.score >= SIMILARITY_FLOOR);
        }
    }

    #[test]
    fn test_truncates_to_k() {
        let docs = corpus();
        let index = SimilarityIndex::build(&docs);
        assert!(index.search("calculus integrals", 1).len() <= 1);
    }

    #[test]
    fn test_empty_corpus() {
        let index = SimilarityIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.search("anything", 5).is_empty());
    }
}
