//! HTTP request handlers.

pub mod chat;
pub mod documents;
pub mod settings;
pub mod static_assets;
