//! Text embedder trait.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`; one embedder instance is shared
//! by concurrent classification requests behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use feedsift::embedding::embedder::TextEmbedder;
//! use feedsift::error::Result;
//!
//! #[derive(Debug)]
//! struct ZeroEmbedder {
//!     dimension: usize,
//! }
//!
//! #[async_trait]
//! impl TextEmbedder for ZeroEmbedder {
//!     async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
//!         Ok(vec![0.0; self.dimension])
//!     }
//!
//!     fn dimension(&self) -> usize {
//!         self.dimension
//!     }
//!
//!     fn name(&self) -> &str {
//!         "zero"
//!     }
//! }
//! ```

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;

/// Character budget for a single embedding input.
///
/// Providers enforce token limits; truncating to a fixed character budget
/// before the call keeps requests inside them. Callers truncate, not the
/// embedder.
pub const MAX_EMBED_CHARS: usize = 4000;

/// Truncate text to the embedding character budget on a char boundary.
pub fn truncate_for_embedding(text: &str) -> &str {
    match text.char_indices().nth(MAX_EMBED_CHARS) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Maps text to a fixed-length dense vector via an external provider.
#[async_trait]
pub trait TextEmbedder: Send + Sync + Debug {
    /// Generate an embedding vector for one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order.
    ///
    /// The default implementation calls `embed` sequentially. Override for
    /// providers with a batched endpoint.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimensionality of the produced vectors.
    fn dimension(&self) -> usize;

    /// Get the name/identifier of this embedder.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CountingEmbedder;

    #[async_trait]
    impl TextEmbedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.chars().count() as f32, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_truncate_for_embedding() {
        let short = "hello";
        assert_eq!(truncate_for_embedding(short), short);

        let long = "x".repeat(MAX_EMBED_CHARS + 100);
        assert_eq!(truncate_for_embedding(&long).len(), MAX_EMBED_CHARS);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_EMBED_CHARS + 10);
        let truncated = truncate_for_embedding(&long);
        assert_eq!(truncated.chars().count(), MAX_EMBED_CHARS);
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let embedder = CountingEmbedder;
        let vectors = embedder.embed_batch(&["a", "bbb", "cc"]).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0][0], 1.0);
        assert_eq!(vectors[1][0], 3.0);
        assert_eq!(vectors[2][0], 2.0);
    }
}
