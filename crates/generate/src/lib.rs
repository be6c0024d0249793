//! Slide content generation for documents.
//!
//! Builds a prompt from source text and options, asks a [`ContentService`]
//! for JSON following [`response_schema`], and shape-checks the answer.

pub mod generator;
pub mod prompt;
pub mod schema;
pub mod service;

pub use generator::ContentGenerator;
pub use prompt::{build_prompt, MAX_SOURCE_CHARS};
pub use schema::{parse_deck, response_schema};
pub use service::{ContentService, GeminiService, ServiceSettings, API_KEY_VAR};
