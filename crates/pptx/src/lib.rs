//! PPTX (Office Open XML) backend for slide decks.
//!
//! Writes a [`deck_core::Presentation`] as a `.pptx` package and reads the
//! outline of existing `.pptx` files back.

mod package;
pub mod reader;
pub mod theme;
pub mod writer;
mod xml;

pub use reader::{DeckOutline, PptxReader, SlideOutline};
pub use theme::Palette;
pub use writer::{file_name_for, PptxExporter};
