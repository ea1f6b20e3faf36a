//! Offline-trainable linear text classifier.
//!
//! TF-IDF features feed an L2-regularized logistic regression fit by
//! per-example SGD; k-fold cross-validation calibrates the operating
//! threshold. The trained model ships as a versioned JSON artifact and is
//! served read-only by [`classifier::LinearClassifier`]. This path is the
//! offline diagnostic; the embedding k-NN classifier is the canonical
//! runtime (see the `knn` and `classify` modules).

pub mod classifier;
pub mod evaluate;
pub mod model;
pub mod pipeline;
pub mod trainer;

pub use classifier::LinearClassifier;
pub use evaluate::{CrossValidationReport, EvaluationMetrics};
pub use model::{LinearModel, ModelMetadata};
pub use pipeline::{TrainOptions, train_model};
pub use trainer::{TrainConfig, sigmoid, train};
