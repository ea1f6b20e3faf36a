//! Precomputed training-embedding artifact.
//!
//! Parallel arrays, one entry per training example. Loaded exactly once at
//! startup; a malformed artifact refuses to load rather than serving a
//! partial store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{Label, TrainingExample};
use crate::embedding::embedder::{TextEmbedder, truncate_for_embedding};
use crate::error::{Result, SiftError};
use crate::knn::{EMBED_BATCH_SIZE, INTER_BATCH_DELAY};

/// Current on-disk format version for embedding store artifacts.
pub const EMBEDDING_STORE_FORMAT_VERSION: u32 = 1;

/// Training embeddings with labels and source texts.
///
/// Invariants: `embeddings`, `labels`, and `texts` have equal lengths; all
/// vectors share one dimensionality; labels are 1 (technical) or 0
/// (non-technical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingStore {
    /// On-disk format version.
    pub format_version: u32,
    /// One dense vector per training example.
    pub embeddings: Vec<Vec<f32>>,
    /// Parallel class labels: 1 = technical, 0 = non-technical.
    pub labels: Vec<u8>,
    /// Parallel source texts, kept for offline audit.
    pub texts: Vec<String>,
}

impl EmbeddingStore {
    /// Build a store from parallel arrays, validating the invariants.
    pub fn new(embeddings: Vec<Vec<f32>>, labels: Vec<u8>, texts: Vec<String>) -> Result<Self> {
        let store = Self {
            format_version: EMBEDDING_STORE_FORMAT_VERSION,
            embeddings,
            labels,
            texts,
        };
        store.validate()?;
        Ok(store)
    }

    /// Validate format version and parallel-array invariants.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != EMBEDDING_STORE_FORMAT_VERSION {
            return Err(SiftError::artifact(format!(
                "Unsupported embedding store format version {} (expected {})",
                self.format_version, EMBEDDING_STORE_FORMAT_VERSION
            )));
        }
        if self.embeddings.is_empty() {
            return Err(SiftError::artifact("Embedding store is empty"));
        }
        if self.embeddings.len() != self.labels.len() || self.labels.len() != self.texts.len() {
            return Err(SiftError::artifact(format!(
                "Parallel array length mismatch: {} embeddings, {} labels, {} texts",
                self.embeddings.len(),
                self.labels.len(),
                self.texts.len()
            )));
        }

        let dimension = self.embeddings[0].len();
        if dimension == 0 {
            return Err(SiftError::artifact("Embeddings have zero dimension"));
        }
        for (i, embedding) in self.embeddings.iter().enumerate() {
            if embedding.len() != dimension {
                return Err(SiftError::artifact(format!(
                    "Embedding {i} has dimension {} (expected {dimension})",
                    embedding.len()
                )));
            }
        }
        for (i, &label) in self.labels.iter().enumerate() {
            if label > 1 {
                return Err(SiftError::artifact(format!(
                    "Label {i} is {label} (expected 0 or 1)"
                )));
            }
        }

        Ok(())
    }

    /// Embed a labeled corpus into a store.
    ///
    /// The offline half of the k-NN path: run once by the training script,
    /// then served read-only. Texts are truncated to the embedding budget
    /// and sent in provider-sized chunks, sequentially, with a short delay
    /// between chunks.
    pub async fn build(
        embedder: &dyn TextEmbedder,
        examples: &[TrainingExample],
    ) -> Result<Self> {
        if examples.is_empty() {
            return Err(SiftError::invalid_argument(
                "cannot build an embedding store from an empty corpus",
            ));
        }

        let mut embeddings = Vec::with_capacity(examples.len());
        for (chunk_index, chunk) in examples.chunks(EMBED_BATCH_SIZE).enumerate() {
            if chunk_index > 0 {
                tokio::time::sleep(INTER_BATCH_DELAY).await;
            }
            let texts: Vec<&str> = chunk
                .iter()
                .map(|example| truncate_for_embedding(&example.text))
                .collect();
            embeddings.extend(embedder.embed_batch(&texts).await?);
            log::info!("embedded {}/{} examples", embeddings.len(), examples.len());
        }

        let labels = examples
            .iter()
            .map(|example| match example.label {
                Label::Technical => 1,
                Label::NonTechnical => 0,
            })
            .collect();
        let texts = examples.iter().map(|example| example.text.clone()).collect();

        Self::new(embeddings, labels, texts)
    }

    /// Number of stored training examples.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Dimensionality shared by all stored vectors.
    pub fn dimension(&self) -> usize {
        self.embeddings.first().map_or(0, Vec::len)
    }

    /// Non-technical examples per technical example in the store.
    pub fn class_ratio(&self) -> Result<f64> {
        let technical = self.labels.iter().filter(|&&l| l == 1).count();
        let non_technical = self.labels.len() - technical;
        if technical == 0 {
            return Err(SiftError::invalid_argument(
                "class ratio undefined: store has no technical examples",
            ));
        }
        Ok(non_technical as f64 / technical as f64)
    }

    /// Write the store to a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json).map_err(|e| {
            SiftError::artifact(format!("Failed to write store {}: {e}", path.display()))
        })?;
        Ok(())
    }

    /// Load and validate a store from a JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SiftError::artifact(format!("Failed to read store {}: {e}", path.display()))
        })?;
        let store: EmbeddingStore = serde_json::from_str(&content).map_err(|e| {
            SiftError::artifact(format!("Failed to parse store {}: {e}", path.display()))
        })?;
        store.validate()?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> EmbeddingStore {
        EmbeddingStore::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![1, 0],
            vec!["rust internals".to_string(), "election recap".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates() {
        let store = sample_store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), 2);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let result = EmbeddingStore::new(
            vec![vec![1.0], vec![2.0]],
            vec![1],
            vec!["a".to_string(), "b".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_ragged_dimensions() {
        let result = EmbeddingStore::new(
            vec![vec![1.0, 0.0], vec![2.0]],
            vec![1, 0],
            vec!["a".to_string(), "b".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let result = EmbeddingStore::new(
            vec![vec![1.0], vec![2.0]],
            vec![1, 3],
            vec!["a".to_string(), "b".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_store() {
        assert!(EmbeddingStore::new(vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn test_class_ratio() {
        let store = EmbeddingStore::new(
            vec![vec![1.0], vec![2.0], vec![3.0]],
            vec![1, 0, 0],
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
        .unwrap();
        assert_eq!(store.class_ratio().unwrap(), 2.0);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = sample_store();

        store.save(&path).unwrap();
        let loaded = EmbeddingStore::load(&path).unwrap();

        assert_eq!(loaded.len(), store.len());
        assert_eq!(loaded.embeddings[0], store.embeddings[0]);
        assert_eq!(loaded.labels, store.labels);
    }

    #[tokio::test]
    async fn test_build_from_corpus() {
        use crate::dataset::{Label, TrainingExample};
        use async_trait::async_trait;

        #[derive(Debug)]
        struct LengthEmbedder;

        #[async_trait]
        impl TextEmbedder for LengthEmbedder {
            async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
                Ok(vec![text.chars().count() as f32, 1.0])
            }

            fn dimension(&self) -> usize {
                2
            }
        }

        let examples = vec![
            TrainingExample::new("rust", Label::Technical),
            TrainingExample::new("gossip", Label::NonTechnical),
        ];

        let store = EmbeddingStore::build(&LengthEmbedder, &examples).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.labels, vec![1, 0]);
        assert_eq!(store.embeddings[0][0], 4.0);
        assert_eq!(store.embeddings[1][0], 6.0);
        assert_eq!(store.texts[1], "gossip");
    }

    #[tokio::test]
    async fn test_build_rejects_empty_corpus() {
        use async_trait::async_trait;

        #[derive(Debug)]
        struct NeverEmbedder;

        #[async_trait]
        impl TextEmbedder for NeverEmbedder {
            async fn embed(&self, _text: &str) -> crate::error::Result<Vec<f32>> {
                unreachable!("no inputs to embed")
            }

            fn dimension(&self) -> usize {
                2
            }
        }

        assert!(EmbeddingStore::build(&NeverEmbedder, &[]).await.is_err());
    }

    #[test]
    fn test_load_rejects_wrong_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = sample_store();
        store.format_version = 42;
        let json = serde_json::to_string(&store).unwrap();
        std::fs::write(&path, json).unwrap();

        assert!(EmbeddingStore::load(&path).is_err());
    }
}
