//! Request and response models for the HTTP API.

pub mod chat;
pub mod documents;
pub mod settings;
