//! Detection of supported input document kinds.

/// MIME type for PDF documents.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// MIME type for plain text documents.
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// The kind of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// PDF, decoded by a PDF engine.
    Pdf,
    /// UTF-8 plain text, read directly.
    PlainText,
}

impl DocumentKind {
    /// Detect kind from a declared content type such as `text/plain; charset=utf-8`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match essence.as_str() {
            PDF_CONTENT_TYPE => Some(Self::Pdf),
            TEXT_CONTENT_TYPE => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Detect kind from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Detect kind from file magic bytes. Only PDF has a signature.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        // PDF files start with "%PDF-"
        if bytes.starts_with(b"%PDF-") {
            return Some(Self::Pdf);
        }

        None
    }

    /// The canonical content type for this kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_CONTENT_TYPE,
            Self::PlainText => TEXT_CONTENT_TYPE,
        }
    }
}
