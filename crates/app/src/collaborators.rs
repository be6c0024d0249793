//! Seams between the controller and the pipeline stages.

use crate::state::ExportedFile;
use async_trait::async_trait;
use deck_core::{DeckContent, Error, GenerationConfig, Presentation, Result};
use deck_generate::{ContentGenerator, ContentService};
use deck_ingest::{DocumentIngestor, PdfEngine};
use deck_pptx::{file_name_for, PptxExporter};
use std::sync::Arc;

/// Turns an uploaded document into source text.
#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn read_document(&self, bytes: Vec<u8>, content_type: String) -> Result<String>;
}

/// Produces deck content from source text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate_deck(&self, text: String, config: GenerationConfig) -> Result<DeckContent>;
}

/// Serializes a presentation into a downloadable file.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export_file(&self, presentation: Presentation) -> Result<ExportedFile>;
}

/// PDF decoding is CPU-bound and runs off the async workers.
#[async_trait]
impl<E: PdfEngine + 'static> Ingestor for Arc<DocumentIngestor<E>> {
    async fn read_document(&self, bytes: Vec<u8>, content_type: String) -> Result<String> {
        let ingestor = Arc::clone(self);
        tokio::task::spawn_blocking(move || ingestor.ingest(&bytes, &content_type))
            .await
            .map_err(|e| Error::Unexpected(format!("ingestion task failed: {}", e)))?
    }
}

#[async_trait]
impl<S: ContentService> Generator for ContentGenerator<S> {
    async fn generate_deck(&self, text: String, config: GenerationConfig) -> Result<DeckContent> {
        self.generate(&text, &config).await
    }
}

#[async_trait]
impl Exporter for PptxExporter {
    async fn export_file(&self, presentation: Presentation) -> Result<ExportedFile> {
        let exporter = *self;
        tokio::task::spawn_blocking(move || {
            let bytes = exporter.export(&presentation)?;
            Ok(ExportedFile {
                file_name: file_name_for(&presentation),
                bytes,
            })
        })
        .await
        .map_err(|e| Error::ExportFailed(format!("export task failed: {}", e)))?
    }
}
