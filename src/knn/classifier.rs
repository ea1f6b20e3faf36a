//! k-nearest-neighbor classification over precomputed embeddings.

use std::cmp::Ordering;
use std::sync::Arc;

use rayon::prelude::*;

use crate::embedding::embedder::{TextEmbedder, truncate_for_embedding};
use crate::error::{Result, SiftError};
use crate::knn::store::EmbeddingStore;
use crate::knn::{EMBED_BATCH_SIZE, INTER_BATCH_DELAY};

/// Default neighbor count.
pub const DEFAULT_K: usize = 15;

/// Default decision threshold on the vote probability.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Non-technical examples per technical example in the default labeled
/// corpus snapshot.
pub const DEFAULT_TRAIN_CLASS_RATIO: f64 = 0.675;

/// Expected non-technical examples per technical example in production
/// feed traffic.
pub const DEFAULT_PRODUCTION_CLASS_RATIO: f64 = 5.0;

/// Stores below this size are scored sequentially; the rayon fan-out costs
/// more than it saves.
const PARALLEL_SCAN_CUTOFF: usize = 100;

/// Multiplicative vote weight correcting train/production prior mismatch.
///
/// Both ratios are expressed as non-technical examples per technical
/// example. A same-similarity non-technical neighbor is up-weighted (or
/// down-weighted) so the decision boundary reflects real-world incidence
/// rather than training incidence.
pub fn prior_correction(train_ratio: f64, production_ratio: f64) -> Result<f64> {
    if train_ratio <= 0.0 || production_ratio <= 0.0 {
        return Err(SiftError::invalid_argument(format!(
            "class ratios must be positive (train {train_ratio}, production {production_ratio})"
        )));
    }
    Ok(production_ratio / train_ratio)
}

/// Cosine similarity between two vectors of equal dimension.
///
/// Zero vectors (and mismatched lengths) yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

/// Settings for the k-NN vote.
#[derive(Debug, Clone)]
pub struct KnnConfig {
    /// Number of neighbors to consult.
    pub k: usize,
    /// Decision threshold on the vote probability.
    pub threshold: f64,
    /// Vote weight applied to non-technical neighbors.
    pub non_technical_weight: f64,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            threshold: DEFAULT_THRESHOLD,
            non_technical_weight: DEFAULT_PRODUCTION_CLASS_RATIO / DEFAULT_TRAIN_CLASS_RATIO,
        }
    }
}

/// A single k-NN classification verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnPrediction {
    /// Probability that the text is technical, in [0, 1].
    pub probability: f64,
    /// Whether the probability clears the configured threshold.
    pub is_technical: bool,
    /// Summed similarity of technical neighbors.
    pub technical_score: f64,
    /// Reweighted summed similarity of non-technical neighbors.
    pub non_technical_score: f64,
}

/// Classifies text by similarity-weighted vote among its nearest stored
/// embeddings.
///
/// The store and configuration are read-only after construction; one
/// classifier may serve concurrent callers. Provider calls are the only
/// suspension points.
#[derive(Debug)]
pub struct KnnClassifier {
    store: EmbeddingStore,
    embedder: Arc<dyn TextEmbedder>,
    config: KnnConfig,
}

impl KnnClassifier {
    /// Create a classifier over a validated store.
    pub fn new(
        store: EmbeddingStore,
        embedder: Arc<dyn TextEmbedder>,
        config: KnnConfig,
    ) -> Result<Self> {
        store.validate()?;
        if config.k == 0 {
            return Err(SiftError::invalid_argument("k must be at least 1"));
        }
        if config.non_technical_weight <= 0.0 {
            return Err(SiftError::invalid_argument(
                "non_technical_weight must be positive",
            ));
        }
        if embedder.dimension() != 0 && embedder.dimension() != store.dimension() {
            return Err(SiftError::invalid_argument(format!(
                "embedder dimension {} does not match store dimension {}",
                embedder.dimension(),
                store.dimension()
            )));
        }

        Ok(Self {
            store,
            embedder,
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// Number of stored training examples.
    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    /// Classify one text.
    pub async fn classify(&self, text: &str) -> Result<KnnPrediction> {
        let query = self.embedder.embed(truncate_for_embedding(text)).await?;
        Ok(self.classify_embedding(&query))
    }

    /// Classify many texts with chunked provider calls.
    ///
    /// Chunks of [`EMBED_BATCH_SIZE`] are issued sequentially with a short
    /// delay between them. Output order matches input order; a failed
    /// chunk yields per-item errors for its texts while later chunks still
    /// run.
    pub async fn classify_batch(&self, texts: &[String]) -> Vec<Result<KnnPrediction>> {
        let mut results = Vec::with_capacity(texts.len());

        for (chunk_index, chunk) in texts.chunks(EMBED_BATCH_SIZE).enumerate() {
            if chunk_index > 0 {
                tokio::time::sleep(INTER_BATCH_DELAY).await;
            }

            let truncated: Vec<&str> = chunk
                .iter()
                .map(|text| truncate_for_embedding(text))
                .collect();
            match self.embedder.embed_batch(&truncated).await {
                Ok(vectors) => {
                    for query in &vectors {
                        results.push(Ok(self.classify_embedding(query)));
                    }
                }
                Err(e) => {
                    log::warn!("embedding batch {chunk_index} failed: {e}");
                    let message = e.to_string();
                    for _ in 0..chunk.len() {
                        results.push(Err(SiftError::embedding(message.clone())));
                    }
                }
            }
        }

        results
    }

    /// Score a precomputed query embedding against the store.
    ///
    /// Pure and deterministic for a fixed store and configuration.
    pub fn classify_embedding(&self, query: &[f32]) -> KnnPrediction {
        let similarities: Vec<f64> = if self.store.len() < PARALLEL_SCAN_CUTOFF {
            self.store
                .embeddings
                .iter()
                .map(|stored| cosine_similarity(query, stored))
                .collect()
        } else {
            self.store
                .embeddings
                .par_iter()
                .map(|stored| cosine_similarity(query, stored))
                .collect()
        };

        let mut order: Vec<usize> = (0..similarities.len()).collect();
        order.sort_by(|&a, &b| {
            similarities[b]
                .partial_cmp(&similarities[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut technical_score = 0.0;
        let mut non_technical_score = 0.0;
        for &i in order.iter().take(self.config.k.min(order.len())) {
            // Negative cosine means the neighbor points away from the
            // query; it carries no vote mass.
            let similarity = similarities[i].max(0.0);
            if self.store.labels[i] == 1 {
                technical_score += similarity;
            } else {
                non_technical_score += similarity * self.config.non_technical_weight;
            }
        }

        let mass = technical_score + non_technical_score;
        let probability = if mass > 0.0 {
            technical_score / mass
        } else {
            0.0
        };

        KnnPrediction {
            probability,
            is_technical: probability >= self.config.threshold,
            technical_score,
            non_technical_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct UnusedEmbedder;

    #[async_trait]
    impl TextEmbedder for UnusedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(SiftError::embedding("not wired in this test"))
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    fn axis_store() -> EmbeddingStore {
        // Technical examples cluster on the x axis, non-technical on y.
        EmbeddingStore::new(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.1, 0.9, 0.0],
            ],
            vec![1, 1, 0, 0],
            vec![
                "rust".to_string(),
                "kernel".to_string(),
                "gossip".to_string(),
                "recipe".to_string(),
            ],
        )
        .unwrap()
    }

    fn classifier(config: KnnConfig) -> KnnClassifier {
        KnnClassifier::new(axis_store(), Arc::new(UnusedEmbedder), config).unwrap()
    }

    #[test]
    fn test_prior_correction() {
        let weight = prior_correction(0.675, 5.0).unwrap();
        assert!((weight - 7.407).abs() < 0.001);

        assert_eq!(prior_correction(1.0, 1.0).unwrap(), 1.0);
        assert!(prior_correction(0.0, 5.0).is_err());
        assert!(prior_correction(1.0, -1.0).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_unweighted_vote_follows_similarity() {
        let config = KnnConfig {
            k: 4,
            threshold: 0.5,
            non_technical_weight: 1.0,
        };
        let knn = classifier(config);

        let technical = knn.classify_embedding(&[1.0, 0.0, 0.0]);
        assert!(technical.is_technical);
        assert!(technical.probability > 0.5);

        let non_technical = knn.classify_embedding(&[0.0, 1.0, 0.0]);
        assert!(!non_technical.is_technical);
        assert!(non_technical.probability < 0.5);
    }

    #[test]
    fn test_prior_weight_shifts_boundary() {
        // Equidistant query: unweighted vote splits 50/50, the production
        // prior pushes it non-technical.
        let query = [0.5, 0.5, 0.0];

        let neutral = classifier(KnnConfig {
            k: 4,
            threshold: 0.5,
            non_technical_weight: 1.0,
        });
        let weighted = classifier(KnnConfig {
            k: 4,
            threshold: 0.5,
            non_technical_weight: prior_correction(0.675, 5.0).unwrap(),
        });

        let neutral_prediction = neutral.classify_embedding(&query);
        let weighted_prediction = weighted.classify_embedding(&query);

        assert!((neutral_prediction.probability - 0.5).abs() < 1e-9);
        assert!(weighted_prediction.probability < 0.2);
        assert!(!weighted_prediction.is_technical);
    }

    #[test]
    fn test_probability_range_and_threshold_consistency() {
        let knn = classifier(KnnConfig::default());
        for query in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.3, 0.7, 0.0]] {
            let prediction = knn.classify_embedding(&query);
            assert!((0.0..=1.0).contains(&prediction.probability));
            assert_eq!(
                prediction.is_technical,
                prediction.probability >= knn.config().threshold
            );
        }
    }

    #[test]
    fn test_zero_vote_mass_falls_back_to_rejection() {
        let knn = classifier(KnnConfig::default());
        let prediction = knn.classify_embedding(&[0.0, 0.0, 1.0]);

        assert_eq!(prediction.probability, 0.0);
        assert!(!prediction.is_technical);
    }

    #[test]
    fn test_deterministic_scoring() {
        let knn = classifier(KnnConfig::default());
        let a = knn.classify_embedding(&[0.6, 0.4, 0.0]);
        let b = knn.classify_embedding(&[0.6, 0.4, 0.0]);
        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad_k = KnnConfig {
            k: 0,
            ..KnnConfig::default()
        };
        assert!(KnnClassifier::new(axis_store(), Arc::new(UnusedEmbedder), bad_k).is_err());

        let bad_weight = KnnConfig {
            non_technical_weight: 0.0,
            ..KnnConfig::default()
        };
        assert!(KnnClassifier::new(axis_store(), Arc::new(UnusedEmbedder), bad_weight).is_err());
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        #[derive(Debug)]
        struct WideEmbedder;

        #[async_trait]
        impl TextEmbedder for WideEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![0.0; 8])
            }

            fn dimension(&self) -> usize {
                8
            }
        }

        let result = KnnClassifier::new(axis_store(), Arc::new(WideEmbedder), KnnConfig::default());
        assert!(result.is_err());
    }
}
