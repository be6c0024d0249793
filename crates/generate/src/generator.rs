//! Presentation content generation.

use crate::prompt::build_prompt;
use crate::schema::{parse_deck, response_schema};
use crate::service::ContentService;
use deck_core::{DeckContent, GenerationConfig, Result};
use serde_json::Value;

/// Turns source text into deck content through a [`ContentService`].
///
/// There is no retry: a failed call is reported to the caller as-is.
pub struct ContentGenerator<S: ContentService> {
    service: S,
    schema: Value,
}

impl<S: ContentService> ContentGenerator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            schema: response_schema(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Generate deck content for `text`.
    ///
    /// The result has no template or title image; combine it with the config
    /// using [`deck_core::merge`].
    pub async fn generate(&self, text: &str, config: &GenerationConfig) -> Result<DeckContent> {
        let prompt = build_prompt(text, config);
        let raw = self.service.generate_json(&prompt, &self.schema).await?;
        let deck = parse_deck(&raw)?;

        log::info!(
            "Generated '{}' with {} slides ({} requested)",
            deck.title,
            deck.slides.len(),
            config.num_slides
        );

        Ok(deck)
    }
}
