//! Conversion of user-supplied documents into plain text.

use crate::kind::DocumentKind;
use crate::pdf::{LopdfEngine, PdfEngine};
use deck_core::{Error, Result, TextNormalizer};
use std::path::Path;

/// Only the first pages of a PDF are read, to bound processing time and the
/// amount of text forwarded to the generator.
pub const MAX_PDF_PAGES: usize = 15;

/// Shorter results are treated as blank or corrupt documents.
pub const MIN_TEXT_CHARS: usize = 50;

/// Separator placed between the text of consecutive PDF pages.
const PAGE_SEPARATOR: &str = "\n\n";

/// Turns PDF and plain text files into text for the generator.
pub struct DocumentIngestor<E: PdfEngine = LopdfEngine> {
    engine: E,
    normalizer: TextNormalizer,
}

impl DocumentIngestor<LopdfEngine> {
    /// Create an ingestor using the lopdf engine.
    pub fn new() -> Self {
        Self::with_engine(LopdfEngine::new())
    }
}

impl Default for DocumentIngestor<LopdfEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PdfEngine> DocumentIngestor<E> {
    /// Create an ingestor around a specific PDF engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Convert a document with a declared content type into text.
    pub fn ingest(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        let kind = DocumentKind::from_content_type(content_type).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "'{}' files are not supported; upload a PDF or a text file",
                content_type
            ))
        })?;

        self.ingest_kind(bytes, kind)
    }

    /// Read a document from disk, detecting its kind from magic bytes then extension.
    pub fn ingest_path(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;

        let kind = DocumentKind::from_magic(&bytes)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(DocumentKind::from_extension)
            })
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "could not detect a supported document type for {}",
                    path.display()
                ))
            })?;

        self.ingest_kind(&bytes, kind)
    }

    fn ingest_kind(&self, bytes: &[u8], kind: DocumentKind) -> Result<String> {
        let text = match kind {
            DocumentKind::PlainText => {
                log::debug!("Reading {} bytes as plain text", bytes.len());
                read_plain_text(bytes)?
            }
            DocumentKind::Pdf => {
                log::debug!("Extracting PDF text from {} bytes", bytes.len());
                self.read_pdf(bytes)?
            }
        };

        let length = text.trim().chars().count();
        if length < MIN_TEXT_CHARS {
            return Err(Error::EmptyOrUnreadable(format!(
                "only {} characters of text found; the document may be blank, scanned or corrupt",
                length
            )));
        }

        Ok(text)
    }

    fn read_pdf(&self, bytes: &[u8]) -> Result<String> {
        let pages = self.engine.page_texts(bytes, MAX_PDF_PAGES)?;

        let texts: Vec<String> = pages
            .iter()
            .map(|page| self.normalizer.normalize(page))
            .filter(|page| !page.is_empty())
            .collect();

        log::debug!(
            "Kept text from {} of {} pages",
            texts.len(),
            pages.len()
        );

        Ok(texts.join(PAGE_SEPARATOR))
    }
}

fn read_plain_text(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::EmptyOrUnreadable(format!("text file is not valid UTF-8: {}", e)))
}
