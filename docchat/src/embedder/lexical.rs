//! Built-in lexical embedder.
//!
//! A hashed term-frequency vectorizer: each lowercased token is hashed into
//! one of `dimensions` buckets and the resulting count vector is
//! L2-normalized. No model weights, no network, fully deterministic. Texts
//! sharing vocabulary land close under cosine similarity, which is enough for
//! single-document retrieval when no embeddings endpoint is available.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use super::{Embedder, Result};

pub struct LexicalEmbedder {
    dimensions: usize,
}

impl LexicalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimensions;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

/// Lowercased alphanumeric tokens; everything else is a separator.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|text| self.vectorize(text)).collect())
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::cosine_similarity;

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let embedder = LexicalEmbedder::new(128);
        let vectors = embedder
            .embed(&["revenue grew in the third quarter".to_string(), "revenue grew in the third quarter".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }

    #[tokio::test]
    async fn vectors_are_l2_normalized() {
        let embedder = LexicalEmbedder::new(128);
        let vectors = embedder.embed(&["some words to normalize".to_string()]).await.unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let embedder = LexicalEmbedder::new(64);
        let vectors = embedder.embed(&["   ".to_string()]).await.unwrap();
        assert!(vectors[0].iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher_than_disjoint() {
        let embedder = LexicalEmbedder::new(512);
        let vectors = embedder
            .embed(&[
                "the contract renewal terms and pricing".to_string(),
                "pricing terms for the contract renewal".to_string(),
                "penguins live in antarctica colonies".to_string(),
            ])
            .await
            .unwrap();

        let related = cosine_similarity(&vectors[0], &vectors[1]);
        let unrelated = cosine_similarity(&vectors[0], &vectors[2]);
        assert!(related > unrelated, "related={related}, unrelated={unrelated}");
    }

    #[tokio::test]
    async fn case_and_punctuation_are_ignored() {
        let embedder = LexicalEmbedder::new(128);
        let vectors = embedder
            .embed(&["Hello, World!".to_string(), "hello world".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }
}
