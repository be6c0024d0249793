//! Core domain types, error taxonomy, inline images and the edit surface
//! for turning documents into slide decks.

pub mod edit;
pub mod error;
pub mod image;
pub mod normalize;
pub mod types;

pub use edit::merge;
pub use error::{Error, ErrorKind, Result};
pub use image::ImageRef;
pub use normalize::TextNormalizer;
pub use types::{Audience, DeckContent, DetailLevel, GenerationConfig, Presentation, Slide, Template};
