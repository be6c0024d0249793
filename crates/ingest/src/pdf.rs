//! PDF text extraction engines.

use deck_core::{Error, Result};
use lopdf::Document;

/// A PDF decoder that yields the text of each page.
pub trait PdfEngine: Send + Sync {
    /// Extract the text of at most `max_pages` pages, in page order.
    ///
    /// A page whose text cannot be extracted yields an empty string rather
    /// than failing the whole document.
    fn page_texts(&self, bytes: &[u8], max_pages: usize) -> Result<Vec<String>>;
}

/// PDF engine backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    /// Create a new lopdf engine.
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LopdfEngine {
    fn page_texts(&self, bytes: &[u8], max_pages: usize) -> Result<Vec<String>> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| Error::EmptyOrUnreadable(format!("could not read PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(Error::EmptyOrUnreadable(
                "PDF is encrypted and cannot be read".to_string(),
            ));
        }

        // get_pages is keyed by 1-based page number, so iteration is in page order
        let pages = doc.get_pages();
        log::debug!(
            "PDF has {} pages, reading up to {}",
            pages.len(),
            max_pages
        );

        let texts = pages
            .keys()
            .take(max_pages)
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            })
            .collect();

        Ok(texts)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build an in-memory PDF with one page per entry of `pages`.
    pub(crate) fn build_pdf(pages: &[String]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::build_pdf;
    use super::*;

    #[test]
    fn test_reads_pages_in_order() {
        let pdf = build_pdf(&["first page".to_string(), "second page".to_string()]);
        let texts = LopdfEngine::new().page_texts(&pdf, 15).unwrap();

        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("first page"));
        assert!(texts[1].contains("second page"));
    }

    #[test]
    fn test_page_cap() {
        let pages: Vec<String> = (1..=4).map(|n| format!("page {}", n)).collect();
        let texts = LopdfEngine::new().page_texts(&build_pdf(&pages), 2).unwrap();
        assert_eq!(texts.len(), 2);
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let err = LopdfEngine::new()
            .page_texts(b"definitely not a pdf document", 15)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyOrUnreadable(_)));
    }
}
