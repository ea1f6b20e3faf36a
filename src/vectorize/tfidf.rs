//! Sparse TF-IDF vectors.

use std::collections::{BTreeMap, HashMap};

/// A sparse term -> weight vector.
///
/// Backed by a `BTreeMap` so iteration order is the sorted term order,
/// which keeps dot products and SGD updates deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<String, f64>,
}

impl SparseVector {
    /// Create an empty sparse vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a term weight.
    pub fn insert(&mut self, term: String, weight: f64) {
        self.weights.insert(term, weight);
    }

    /// Get the weight for a term, or 0.0 if absent.
    pub fn weight(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    /// Iterate over (term, weight) entries in sorted term order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(term, &weight)| (term.as_str(), weight))
    }

    /// Number of non-zero entries.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check whether the vector has no entries.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Dot product against a dense term -> weight map.
    ///
    /// Iterates this vector's entries (the sparse side), so the sum order
    /// is the sorted term order.
    pub fn dot(&self, other: &HashMap<String, f64>) -> f64 {
        self.iter()
            .map(|(term, weight)| weight * other.get(term).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Convert a token list into a sparse TF-IDF vector.
///
/// Term frequency is sublinear (`1 + ln(count)`) and normalized by the
/// token count of the document, then multiplied by the stored IDF.
/// Out-of-vocabulary terms are dropped.
pub fn vectorize(tokens: &[String], idf: &HashMap<String, f64>) -> SparseVector {
    let mut vector = SparseVector::new();
    if tokens.is_empty() {
        return vector;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let doc_length = tokens.len() as f64;
    for (term, count) in counts {
        if let Some(&term_idf) = idf.get(term) {
            let tf = (1.0 + (count as f64).ln()) / doc_length;
            vector.insert(term.to_string(), tf * term_idf);
        }
    }

    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_vectorize_sublinear_tf() {
        let mut idf = HashMap::new();
        idf.insert("rust".to_string(), 2.0);
        idf.insert("tokio".to_string(), 1.5);

        let vector = vectorize(&tokens(&["rust", "rust", "tokio"]), &idf);

        let expected_rust = (1.0 + 2.0f64.ln()) / 3.0 * 2.0;
        let expected_tokio = (1.0 + 1.0f64.ln()) / 3.0 * 1.5;
        assert!((vector.weight("rust") - expected_rust).abs() < 1e-12);
        assert!((vector.weight("tokio") - expected_tokio).abs() < 1e-12);
    }

    #[test]
    fn test_vectorize_drops_out_of_vocabulary_terms() {
        let mut idf = HashMap::new();
        idf.insert("rust".to_string(), 1.0);

        let vector = vectorize(&tokens(&["rust", "celebrity"]), &idf);

        assert_eq!(vector.len(), 1);
        assert_eq!(vector.weight("celebrity"), 0.0);
    }

    #[test]
    fn test_vectorize_empty_tokens() {
        let idf = HashMap::new();
        assert!(vectorize(&[], &idf).is_empty());
    }

    #[test]
    fn test_dot_product() {
        let mut idf = HashMap::new();
        idf.insert("alpha".to_string(), 1.0);
        idf.insert("beta".to_string(), 1.0);
        let vector = vectorize(&tokens(&["alpha", "beta"]), &idf);

        let mut weights = HashMap::new();
        weights.insert("alpha".to_string(), 2.0);
        weights.insert("gamma".to_string(), 10.0);

        let expected = vector.weight("alpha") * 2.0;
        assert!((vector.dot(&weights) - expected).abs() < 1e-12);
    }
}
