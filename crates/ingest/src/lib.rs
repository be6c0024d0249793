//! Document ingestion backend for slide-deck generation.
//!
//! Reads plain text files directly and delegates PDF decoding to a
//! [`PdfEngine`], capped at the first pages of the document.

pub mod ingestor;
pub mod kind;
pub mod pdf;

pub use ingestor::{DocumentIngestor, MAX_PDF_PAGES, MIN_TEXT_CHARS};
pub use kind::DocumentKind;
pub use pdf::{LopdfEngine, PdfEngine};
