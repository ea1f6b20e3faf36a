//! Decision combiner over the k-NN classifier, with fail-safe rejection.
//!
//! [`ContentClassifier`] is the seam the ingestion and cleanup collaborators
//! consume. It always scores `title + description`; when a body excerpt is
//! long enough to carry signal it is scored independently and the combined
//! probability is the minimum of the two. The conjunctive policy exists
//! because a technical-sounding title masking non-technical body content is
//! the dominant observed failure mode.
//!
//! When the classifier was never initialized (missing provider key,
//! unavailable training data), every call returns a rejection instead of
//! erroring: the system prefers false negatives over false positives when
//! broken.

pub mod stats;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::embedding::embedder::TextEmbedder;
use crate::error::Result;
use crate::knn::classifier::{KnnClassifier, KnnConfig, KnnPrediction};
use crate::knn::store::EmbeddingStore;

pub use stats::{ClassificationCounters, ClassificationStats};

/// Default decision threshold on the combined probability.
pub const TECHNICAL_THRESHOLD: f64 = 0.5;

/// Body excerpts at or below this length are ignored; short fragments
/// embed too noisily to veto a title/description verdict.
pub const MIN_BODY_CHARS: usize = 100;

/// Final verdict for one piece of content.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassificationResult {
    /// Combined probability that the content is technical, in [0, 1].
    pub probability: f64,
    /// Whether the combined probability clears the threshold.
    pub is_technical: bool,
    /// Probability from the title + description signal.
    pub title_desc_prob: f64,
    /// Probability from the body signal, when one was scored.
    pub body_prob: Option<f64>,
}

impl ClassificationResult {
    /// The fail-safe rejection returned when the classifier is not ready
    /// or a provider call failed.
    fn rejected() -> Self {
        Self {
            probability: 0.0,
            is_technical: false,
            title_desc_prob: 0.0,
            body_prob: None,
        }
    }
}

/// One content item for batch classification.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Item title.
    pub title: String,
    /// Optional short description.
    pub description: Option<String>,
    /// Optional body excerpt.
    pub body: Option<String>,
}

/// The classification seam consumed by ingestion and cleanup.
///
/// An explicit handle rather than process-global state: construct once via
/// [`ContentClassifier::initialize`], share via `Arc`, and thread into
/// every call site. The handle is read-only after construction, so
/// concurrent callers need no locking; initialization happens-before any
/// inference by construction.
#[derive(Debug)]
pub struct ContentClassifier {
    knn: Option<KnnClassifier>,
    stats: ClassificationStats,
}

impl ContentClassifier {
    /// Load the embedding artifact and build a ready classifier.
    ///
    /// A missing or malformed artifact is a fatal error: refusing to serve
    /// beats silently classifying with a partial model.
    pub fn initialize(embedder: Arc<dyn TextEmbedder>, store_path: &Path) -> Result<Self> {
        Self::with_config(embedder, store_path, KnnConfig::default())
    }

    /// Load the embedding artifact with explicit k-NN settings.
    pub fn with_config(
        embedder: Arc<dyn TextEmbedder>,
        store_path: &Path,
        config: KnnConfig,
    ) -> Result<Self> {
        let store = EmbeddingStore::load(store_path)?;
        Self::from_store(embedder, store, config)
    }

    /// Build a ready classifier from an already-loaded store.
    pub fn from_store(
        embedder: Arc<dyn TextEmbedder>,
        store: EmbeddingStore,
        config: KnnConfig,
    ) -> Result<Self> {
        let knn = KnnClassifier::new(store, embedder, config)?;
        log::info!(
            "content classifier ready: {} training embeddings, k={}",
            knn.store_len(),
            knn.config().k
        );
        Ok(Self {
            knn: Some(knn),
            stats: ClassificationStats::new(),
        })
    }

    /// A classifier that was never initialized; every verdict is the
    /// fail-safe rejection.
    pub fn disabled() -> Self {
        Self {
            knn: None,
            stats: ClassificationStats::new(),
        }
    }

    /// Whether the classifier holds a loaded model.
    pub fn is_ready(&self) -> bool {
        self.knn.is_some()
    }

    /// Classify one content item. Never errors; provider failures are
    /// logged, counted, and resolved as rejections.
    pub async fn classify_content(
        &self,
        title: &str,
        description: Option<&str>,
        body: Option<&str>,
    ) -> ClassificationResult {
        let Some(knn) = &self.knn else {
            self.stats.record_rejected();
            return ClassificationResult::rejected();
        };

        let title_desc = join_title_desc(title, description);
        let title_desc_prediction = match knn.classify(&title_desc).await {
            Ok(prediction) => prediction,
            Err(e) => {
                log::warn!(
                    "classification failed at title/description for {:?}: {e}",
                    title_prefix(title)
                );
                self.stats.record_error();
                return ClassificationResult::rejected();
            }
        };

        let body_prediction = match body.filter(|b| b.chars().count() > MIN_BODY_CHARS) {
            Some(body_text) => match knn.classify(body_text).await {
                Ok(prediction) => Some(prediction),
                Err(e) => {
                    log::warn!(
                        "classification failed at body for {:?}: {e}",
                        title_prefix(title)
                    );
                    self.stats.record_error();
                    return ClassificationResult::rejected();
                }
            },
            None => None,
        };

        let result = self.combine(title_desc_prediction, body_prediction);
        self.stats.record_verdict(result.is_technical);
        result
    }

    /// Classify many items with batched provider calls.
    ///
    /// Output order matches input order. A failed provider chunk rejects
    /// only the items in that chunk; the rest of the batch continues.
    pub async fn batch_classify_content(&self, items: &[ContentItem]) -> Vec<ClassificationResult> {
        let Some(knn) = &self.knn else {
            for _ in items {
                self.stats.record_rejected();
            }
            return items.iter().map(|_| ClassificationResult::rejected()).collect();
        };

        let title_desc_texts: Vec<String> = items
            .iter()
            .map(|item| join_title_desc(&item.title, item.description.as_deref()))
            .collect();
        let title_desc_predictions = knn.classify_batch(&title_desc_texts).await;

        // Bodies are scored in a second, smaller batch; most feed items
        // carry no body excerpt.
        let body_indices: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.body
                    .as_deref()
                    .is_some_and(|b| b.chars().count() > MIN_BODY_CHARS)
            })
            .map(|(i, _)| i)
            .collect();
        let body_texts: Vec<String> = body_indices
            .iter()
            .map(|&i| items[i].body.clone().unwrap_or_default())
            .collect();
        let mut body_predictions: Vec<Option<Result<KnnPrediction>>> =
            (0..items.len()).map(|_| None).collect();
        if !body_texts.is_empty() {
            for (&i, prediction) in body_indices
                .iter()
                .zip(knn.classify_batch(&body_texts).await)
            {
                body_predictions[i] = Some(prediction);
            }
        }

        title_desc_predictions
            .into_iter()
            .zip(body_predictions)
            .zip(items)
            .map(|((title_desc, body), item)| {
                let title_desc = match title_desc {
                    Ok(prediction) => prediction,
                    Err(e) => {
                        log::warn!(
                            "batch classification failed at title/description for {:?}: {e}",
                            title_prefix(&item.title)
                        );
                        self.stats.record_error();
                        return ClassificationResult::rejected();
                    }
                };
                let body = match body {
                    Some(Ok(prediction)) => Some(prediction),
                    Some(Err(e)) => {
                        log::warn!(
                            "batch classification failed at body for {:?}: {e}",
                            title_prefix(&item.title)
                        );
                        self.stats.record_error();
                        return ClassificationResult::rejected();
                    }
                    None => None,
                };

                let result = self.combine(title_desc, body);
                self.stats.record_verdict(result.is_technical);
                result
            })
            .collect()
    }

    /// Snapshot of the running counters.
    pub fn stats(&self) -> ClassificationCounters {
        self.stats.snapshot()
    }

    /// Reset the running counters to zero.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn combine(
        &self,
        title_desc: KnnPrediction,
        body: Option<KnnPrediction>,
    ) -> ClassificationResult {
        let threshold = self
            .knn
            .as_ref()
            .map_or(TECHNICAL_THRESHOLD, |knn| knn.config().threshold);

        let probability = match body {
            Some(body_prediction) => title_desc.probability.min(body_prediction.probability),
            None => title_desc.probability,
        };

        ClassificationResult {
            probability,
            is_technical: probability >= threshold,
            title_desc_prob: title_desc.probability,
            body_prob: body.map(|p| p.probability),
        }
    }
}

fn join_title_desc(title: &str, description: Option<&str>) -> String {
    match description {
        Some(description) if !description.trim().is_empty() => {
            format!("{title} {description}")
        }
        _ => title.to_string(),
    }
}

fn title_prefix(title: &str) -> &str {
    match title.char_indices().nth(40) {
        Some((byte_index, _)) => &title[..byte_index],
        None => title,
    }
}
