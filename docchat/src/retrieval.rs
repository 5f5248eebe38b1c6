//! Cosine-similarity ranking of document chunks against a question.

use crate::store::Chunk;

/// A chunk scored against a query vector.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Position of the chunk within its document
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// Zero-magnitude vectors score 0.0 rather than dividing by zero. Mismatched
/// lengths are compared over the shared prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Rank chunks against a query embedding and return up to `k` results,
/// best first. Ties resolve to the earlier chunk.
pub fn top_k(query: &[f32], chunks: &[Chunk], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| ScoredChunk {
            index,
            text: chunk.text.clone(),
            score: cosine_similarity(query, &chunk.embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.index.cmp(&b.index)));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn top_k_orders_by_descending_score() {
        let chunks = vec![
            chunk("weak", vec![0.1, 1.0]),
            chunk("best", vec![1.0, 0.0]),
            chunk("middle", vec![1.0, 0.5]),
        ];

        let results = top_k(&[1.0, 0.0], &chunks, 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "best");
        assert_eq!(results[1].text, "middle");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn top_k_returns_all_when_fewer_than_k() {
        let chunks = vec![chunk("only", vec![1.0, 0.0])];
        let results = top_k(&[1.0, 0.0], &chunks, 5);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn ties_resolve_to_earlier_chunk() {
        let chunks = vec![chunk("first", vec![1.0, 0.0]), chunk("second", vec![1.0, 0.0])];
        let results = top_k(&[1.0, 0.0], &chunks, 1);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[0].text, "first");
    }

    #[test]
    fn empty_chunks_yield_empty_results() {
        assert!(top_k(&[1.0], &[], 3).is_empty());
    }
}
