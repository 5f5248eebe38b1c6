//! Greedy paragraph chunking.
//!
//! Lines are packed into chunks of roughly `max_chunk_chars` characters so
//! that each chunk stays a coherent piece of context for retrieval. A single
//! line longer than the cap still becomes its own (oversized) chunk rather
//! than being split mid-sentence.

use crate::config::RetrievalConfig;

/// Split text into retrieval-sized chunks.
///
/// Lines whose trimmed length is below `min_line_chars` are dropped (page
/// numbers, stray separators). Remaining lines are greedily packed: when
/// adding a line would push the current chunk past `max_chunk_chars`, the
/// chunk is flushed and the line starts a new one.
pub fn chunk_text(text: &str, config: &RetrievalConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        if line.trim().len() < config.min_line_chars {
            continue;
        }

        if current.len() + line.len() > config.max_chunk_chars {
            if !current.is_empty() {
                chunks.push(current.trim().to_string());
            }
            current = line.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
