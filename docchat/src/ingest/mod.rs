//! Document ingestion: text extraction and chunking.
//!
//! Uploads pass through this module before they become searchable. [`extract`]
//! turns a file on disk into plain text, [`chunker`] packs that text into
//! retrieval-sized chunks.

mod chunker;
mod extract;

pub use chunker::chunk_text;
pub use extract::{DocumentFormat, ExtractError, extract_text};
