//! TF-IDF vectorization over extracted document text.
//!
//! The vectorizer is fit per request on one user's corpus, which stays
//! small enough (hundreds of documents) that rebuilding beats keeping a
//! stale index coherent across uploads, edits, and deletes.

use std::collections::HashMap;

/// Common English words excluded from the vocabulary.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have",
    "he", "her", "his", "how", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most",
    "my", "no", "not", "of", "on", "one", "only", "or", "other", "our", "out", "over", "she", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "to", "under", "up", "was", "we", "were", "what", "when", "where", "which", "who",
    "will", "with", "would", "you", "your",
];

/// Sparse vector: (vocabulary index, weight) pairs sorted by index.
pub type SparseVector = Vec<(usize, f32)>;

/// Split text into lowercase alphanumeric terms, dropping one-character
/// tokens and stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// TF-IDF vectorizer fit on a corpus of tokenized documents.
pub struct TfIdfVectorizer {
    vocab: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfIdfVectorizer {
    /// Fit vocabulary and inverse document frequencies on a corpus.
    ///
    /// Uses smoothed IDF: `ln((1 + n) / (1 + df)) + 1`, so terms present
    /// in every document still carry a small weight.
    pub fn fit(corpus: &[Vec<String>]) -> Self {
        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for tokens in corpus {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let idx = match vocab.get(token) {
                    Some(&idx) => idx,
                    None => {
                        let idx = vocab.len();
                        vocab.insert(token.clone(), idx);
                        doc_freq.push(0);
                        idx
                    }
                };
                if !seen.contains(&idx) {
                    seen.push(idx);
                    doc_freq[idx] += 1;
                }
            }
        }

        let n = corpus.len() as f32;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        Self { vocab, idf }
    }

    /// Number of distinct terms in the fitted vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Transform tokens into an l2-normalized sparse TF-IDF vector.
    ///
    /// Out-of-vocabulary tokens are dropped; an all-unknown input yields
    /// an empty vector.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocab.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        vector.sort_unstable_by_key(|&(idx, _)| idx);

        let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity of two sorted sparse vectors.
///
/// Inputs from [`TfIdfVectorizer::transform`] are unit-length, so the
/// dot product is the cosine.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut dot = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Linear Algebra, chapter-3!"),
            vec!["linear", "algebra", "chapter"]
        );
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        assert_eq!(tokenize("the cat is on a mat"), vec!["cat", "mat"]);
        assert_eq!(tokenize("x y z"), Vec::<String>::new());
    }

    #[test]
    fn test_fit_assigns_vocab_and_idf() {
        let corpus = vec![
            tokenize("calculus derivatives limits"),
            tokenize("calculus integrals"),
            tokenize("organic chemistry"),
        ];
        let vectorizer = TfIdfVectorizer::fit(&corpus);
        assert_eq!(vectorizer.vocab_size(), 6);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let corpus = vec![tokenize("alpha beta gamma"), tokenize("alpha delta")];
        let vectorizer = TfIdfVectorizer::fit(&corpus);
        let v = vectorizer.transform(&tokenize("alpha beta beta"));
        let norm: f32 = v.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_drops_unknown_terms() {
        let corpus = vec![tokenize("alpha beta")];
        let vectorizer = TfIdfVectorizer::fit(&corpus);
        assert!(vectorizer.transform(&tokenize("zeta eta")).is_empty());
    }

    #[test]
    fn test_cosine_identity_and_orthogonal() {
        let corpus = vec![tokenize("alpha beta"), tokenize("gamma delta")];
        let vectorizer = TfIdfVectorizer::fit(&corpus);

        let a = vectorizer.transform(&tokenize("alpha beta"));
        let b = vectorizer.transform(&tokenize("gamma delta"));

        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
        assert!(cosine(&a, &b).abs() < 1e-5);
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        // "common" appears everywhere, "rare" once.
        let corpus = vec![
            tokenize("common rare"),
            tokenize("common filler"),
            tokenize("common other"),
        ];
        let vectorizer = TfIdfVectorizer::fit(&corpus);
        let v = vectorizer.transform(&tokenize("common rare"));

        let weights: HashMap<usize, f32> = v.into_iter().collect();
        let common_idx = *vectorizer.vocab.get("common").unwrap();
        let rare_idx = *vectorizer.vocab.get("rare").unwrap();
        assert!(weights[&rare_idx] > weights[&common_idx]);
    }
}
