//! Vocabulary construction with document-frequency pruning.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Document-frequency filter settings for vocabulary construction.
///
/// Terms that appear in almost no documents are unreliable signal; terms
/// that appear in almost all documents have no discriminative value. Both
/// are pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df_ratio: f64,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df_ratio: 0.95,
        }
    }
}

/// A pruned term vocabulary with per-term inverse document frequencies.
///
/// Built from the training corpus only and frozen once the IDF weights are
/// computed. `IDF(t) = ln((N + 1) / (df(t) + 1)) + 1`, defined only for
/// terms that survive the document-frequency filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Term -> inverse document frequency, for kept terms only.
    idf: HashMap<String, f64>,
    /// Number of documents the vocabulary was built from.
    n_documents: usize,
}

impl Vocabulary {
    /// Build a vocabulary from tokenized documents.
    pub fn build(documents: &[Vec<String>], config: &VocabularyConfig) -> Self {
        let n_documents = documents.len();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();

        for tokens in documents {
            let unique_terms: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique_terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_df = (n_documents as f64 * config.max_df_ratio).floor() as usize;

        let idf = document_frequency
            .into_iter()
            .filter(|&(_, df)| df >= config.min_df && df <= max_df)
            .map(|(term, df)| {
                let weight = ((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0;
                (term.to_string(), weight)
            })
            .collect();

        Vocabulary { idf, n_documents }
    }

    /// Get the term -> IDF map.
    pub fn idf(&self) -> &HashMap<String, f64> {
        &self.idf
    }

    /// Consume the vocabulary, returning the IDF map.
    pub fn into_idf(self) -> HashMap<String, f64> {
        self.idf
    }

    /// Number of terms in the vocabulary.
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    /// Check whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Check whether a term survived the document-frequency filter.
    pub fn contains(&self, term: &str) -> bool {
        self.idf.contains_key(term)
    }

    /// Number of documents the vocabulary was built from.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}
