//! Embedding-based k-nearest-neighbor classifier.
//!
//! The canonical runtime path: precomputed training embeddings are loaded
//! once, and each query casts a similarity-weighted, class-reweighted vote
//! among its nearest neighbors. The class reweighting corrects for the
//! mismatch between the labeled corpus and production class priors.

use std::time::Duration;

pub mod classifier;
pub mod store;

pub use classifier::{KnnClassifier, KnnConfig, KnnPrediction, cosine_similarity, prior_correction};
pub use store::EmbeddingStore;

/// Provider batch-size limit for one embeddings call.
pub(crate) const EMBED_BATCH_SIZE: usize = 50;

/// Pause between consecutive provider batches. A throttling policy, not a
/// correctness requirement; replaceable with a token-bucket limiter.
pub(crate) const INTER_BATCH_DELAY: Duration = Duration::from_millis(200);
