//! The application controller state machine.
//!
//! Status transitions:
//!
//! ```text
//! Idle/Error --ingest--> ParsingPdf --> Idle | Error
//! Idle/Error --generate--> GeneratingContent --> Success | Error
//! any non-busy with presentation --export--> GeneratingPpt --> Success | Error
//! any --reset--> Idle
//! ```
//!
//! The state lock is never held across an await. Each asynchronous step
//! marks the state busy, releases the lock, awaits its collaborator and then
//! applies the result. A reset advances the epoch so results from steps
//! started before it are dropped.

use crate::collaborators::{Exporter, Generator, Ingestor};
use crate::state::{AppState, Dispatch, ExportedFile, Status};
use deck_core::{GenerationConfig, Presentation, Result};
use deck_generate::{ContentGenerator, GeminiService, ServiceSettings};
use deck_ingest::DocumentIngestor;
use deck_pptx::PptxExporter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Controller wired to the real ingestion, Gemini generation and PPTX export.
pub type GeminiController =
    Controller<Arc<DocumentIngestor>, ContentGenerator<GeminiService>, PptxExporter>;

struct Shared {
    app: AppState,
    epoch: u64,
}

struct Inner<I, G, X> {
    state: Mutex<Shared>,
    ingestor: I,
    generator: G,
    exporter: X,
}

/// Cloneable handle to the application state and its collaborators.
pub struct Controller<I, G, X> {
    inner: Arc<Inner<I, G, X>>,
}

impl<I, G, X> Clone for Controller<I, G, X> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl GeminiController {
    /// Build a controller that generates through the Gemini API.
    pub fn with_gemini(settings: ServiceSettings) -> Self {
        Controller::new(
            Arc::new(DocumentIngestor::new()),
            ContentGenerator::new(GeminiService::new(settings)),
            PptxExporter::new(),
        )
    }
}

impl<I, G, X> Controller<I, G, X>
where
    I: Ingestor,
    G: Generator,
    X: Exporter,
{
    pub fn new(ingestor: I, generator: G, exporter: X) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Shared {
                    app: AppState::default(),
                    epoch: 0,
                }),
                ingestor,
                generator,
                exporter,
            }),
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AppState {
        self.lock().app.clone()
    }

    pub fn status(&self) -> Status {
        self.lock().app.status
    }

    /// Load a document as the new source text.
    ///
    /// Ignored while a presentation exists; `reset` clears it first.
    pub async fn ingest(&self, bytes: Vec<u8>, content_type: &str) -> Dispatch {
        let epoch = {
            let mut shared = self.lock();
            if !shared.app.status.accepts_input() || shared.app.presentation.is_some() {
                log::debug!("Ignoring upload while {}", shared.app.status);
                return Dispatch::Ignored;
            }
            shared.app.status = Status::ParsingPdf;
            shared.epoch
        };

        log::debug!("Ingesting {} bytes of {}", bytes.len(), content_type);
        let result = self
            .inner
            .ingestor
            .read_document(bytes, content_type.to_string())
            .await;

        self.settle(epoch, "ingest", |app| match result {
            Ok(text) => {
                app.input_text = text;
                app.error = None;
                (Status::Idle, Status::Idle)
            }
            Err(e) => {
                app.error = Some(e);
                (Status::Error, Status::Error)
            }
        })
    }

    /// Replace the source text with pasted text.
    pub fn set_input_text(&self, text: impl Into<String>) -> Dispatch {
        let mut shared = self.lock();
        if shared.app.status.is_busy() || shared.app.presentation.is_some() {
            return Dispatch::Ignored;
        }
        shared.app.input_text = text.into();
        Dispatch::Settled(shared.app.status)
    }

    /// Change the generation options.
    ///
    /// The update runs on a copy; the stored config only changes when it
    /// succeeds.
    pub fn configure<F>(&self, update: F) -> Result<Dispatch>
    where
        F: FnOnce(&mut GenerationConfig) -> Result<()>,
    {
        let mut shared = self.lock();
        if shared.app.status.is_busy() {
            return Ok(Dispatch::Ignored);
        }
        let mut config = shared.app.config.clone();
        update(&mut config)?;
        shared.app.config = config;
        Ok(Dispatch::Settled(shared.app.status))
    }

    /// Generate a presentation from the current source text.
    pub async fn generate(&self) -> Dispatch {
        let (epoch, text, config) = {
            let mut shared = self.lock();
            if !shared.app.status.accepts_input() {
                log::debug!("Ignoring generate while {}", shared.app.status);
                return Dispatch::Ignored;
            }
            if shared.app.input_text.trim().is_empty() {
                log::debug!("Ignoring generate without source text");
                return Dispatch::Ignored;
            }
            shared.app.status = Status::GeneratingContent;
            (
                shared.epoch,
                shared.app.input_text.clone(),
                shared.app.config.clone(),
            )
        };

        let result = self
            .inner
            .generator
            .generate_deck(text, config.clone())
            .await;

        self.settle(epoch, "generate", |app| match result {
            Ok(content) => {
                app.presentation = Some(deck_core::merge(content, &config));
                app.error = None;
                (Status::Success, Status::Success)
            }
            Err(e) => {
                app.presentation = None;
                app.error = Some(e);
                (Status::Error, Status::Error)
            }
        })
    }

    pub fn attach_slide_image(&self, index: usize, bytes: &[u8]) -> Result<Dispatch> {
        self.edit(|p| p.attach_slide_image(index, bytes))
    }

    pub fn remove_slide_image(&self, index: usize) -> Result<Dispatch> {
        self.edit(|p| p.remove_slide_image(index))
    }

    pub fn attach_title_image(&self, bytes: &[u8]) -> Result<Dispatch> {
        self.edit(|p| p.attach_title_image(bytes))
    }

    pub fn remove_title_image(&self) -> Result<Dispatch> {
        self.edit(|p| Ok(p.remove_title_image()))
    }

    pub fn apply_template(&self, id: &str) -> Result<Dispatch> {
        self.edit(|p| Ok(p.apply_template(id)))
    }

    /// Export the current presentation.
    ///
    /// A failure is recorded in the state and also returned; the
    /// presentation is kept either way.
    pub async fn export(&self) -> Dispatch<Result<ExportedFile>> {
        let (epoch, presentation) = {
            let mut shared = self.lock();
            if shared.app.status.is_busy() {
                log::debug!("Ignoring export while {}", shared.app.status);
                return Dispatch::Ignored;
            }
            let Some(presentation) = shared.app.presentation.clone() else {
                return Dispatch::Ignored;
            };
            shared.app.status = Status::GeneratingPpt;
            (shared.epoch, presentation)
        };

        let result = self.inner.exporter.export_file(presentation).await;

        self.settle(epoch, "export", |app| match result {
            Ok(file) => {
                app.error = None;
                (Status::Success, Ok(file))
            }
            Err(e) => {
                app.error = Some(e.clone());
                (Status::Error, Err(e))
            }
        })
    }

    /// Return to a blank slate, keeping the chosen generation options
    /// except the title image.
    pub fn reset(&self) -> Dispatch {
        let mut shared = self.lock();
        shared.epoch += 1;

        let app = &mut shared.app;
        app.status = Status::Idle;
        app.input_text.clear();
        app.presentation = None;
        app.error = None;
        app.config.remove_title_image();

        log::info!("State reset");
        Dispatch::Settled(Status::Idle)
    }

    /// Replace the presentation with an edited copy.
    fn edit<F>(&self, change: F) -> Result<Dispatch>
    where
        F: FnOnce(&Presentation) -> Result<Presentation>,
    {
        let mut shared = self.lock();
        if shared.app.status.is_busy() {
            return Ok(Dispatch::Ignored);
        }
        let Some(current) = shared.app.presentation.as_ref() else {
            return Ok(Dispatch::Ignored);
        };

        let edited = change(current)?;
        shared.app.presentation = Some(edited);
        Ok(Dispatch::Settled(shared.app.status))
    }

    /// Apply the result of an asynchronous step unless a reset happened
    /// since it started.
    fn settle<T, F>(&self, epoch: u64, step: &str, apply: F) -> Dispatch<T>
    where
        F: FnOnce(&mut AppState) -> (Status, T),
    {
        let mut shared = self.lock();
        if shared.epoch != epoch {
            log::debug!("Discarding {} result that finished after a reset", step);
            return Dispatch::Ignored;
        }

        let (status, value) = apply(&mut shared.app);
        shared.app.status = status;
        match &shared.app.error {
            Some(e) if status == Status::Error => log::info!("{} failed: {}", step, e),
            _ => log::info!("{} finished, now {}", step, status),
        }
        Dispatch::Settled(value)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deck_core::{DeckContent, Error, Slide, Template};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const SOURCE: &str = "Photosynthesis converts light energy into chemical energy in plants.";

    /// 1x1 grayscale PNG.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x3A,
        0x7E, 0x9B, 0x55, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60,
        0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x48, 0xAF, 0xA4, 0x71, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    struct FakeIngestor;

    #[async_trait]
    impl Ingestor for FakeIngestor {
        async fn read_document(&self, bytes: Vec<u8>, content_type: String) -> Result<String> {
            match content_type.as_str() {
                "text/plain" => String::from_utf8(bytes)
                    .map_err(|e| Error::EmptyOrUnreadable(e.to_string())),
                other => Err(Error::UnsupportedFormat(other.to_string())),
            }
        }
    }

    /// Generator that counts calls and optionally waits for a signal.
    #[derive(Clone, Default)]
    struct FakeGenerator {
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate_deck(&self, _text: String, config: GenerationConfig) -> Result<DeckContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(Error::GenerationFailed("model unavailable".to_string()));
            }
            Ok(DeckContent {
                title: "Photosynthesis".to_string(),
                subtitle: None,
                slides: (1..=config.num_slides)
                    .map(|n| Slide::new(format!("Part {}", n), vec!["point".into()], ""))
                    .collect(),
            })
        }
    }

    struct FakeExporter {
        fail: bool,
    }

    #[async_trait]
    impl Exporter for FakeExporter {
        async fn export_file(&self, presentation: Presentation) -> Result<ExportedFile> {
            if self.fail {
                return Err(Error::ExportFailed("disk full".to_string()));
            }
            Ok(ExportedFile {
                file_name: format!("{}.pptx", presentation.title),
                bytes: vec![1, 2, 3],
            })
        }
    }

    type TestController = Controller<FakeIngestor, FakeGenerator, FakeExporter>;

    fn controller(generator: FakeGenerator, export_fails: bool) -> TestController {
        Controller::new(FakeIngestor, generator, FakeExporter { fail: export_fails })
    }

    async fn generated(generator: FakeGenerator, export_fails: bool) -> TestController {
        let ctl = controller(generator, export_fails);
        ctl.set_input_text(SOURCE);
        assert_eq!(ctl.generate().await, Dispatch::Settled(Status::Success));
        ctl
    }

    #[tokio::test]
    async fn test_ingest_replaces_text() {
        let ctl = controller(FakeGenerator::default(), false);
        let dispatch = ctl.ingest(SOURCE.as_bytes().to_vec(), "text/plain").await;

        assert_eq!(dispatch, Dispatch::Settled(Status::Idle));
        let state = ctl.snapshot();
        assert_eq!(state.input_text, SOURCE);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_ingest_keeps_text() {
        let ctl = controller(FakeGenerator::default(), false);
        ctl.set_input_text(SOURCE);

        let dispatch = ctl.ingest(b"PK\x03\x04".to_vec(), "application/zip").await;

        assert_eq!(dispatch, Dispatch::Settled(Status::Error));
        let state = ctl.snapshot();
        assert_eq!(state.input_text, SOURCE);
        assert!(matches!(state.error, Some(Error::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_generate_without_text_is_ignored() {
        let generator = FakeGenerator::default();
        let ctl = controller(generator.clone(), false);
        ctl.set_input_text("   ");

        assert!(ctl.generate().await.is_ignored());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctl.status(), Status::Idle);
    }

    #[tokio::test]
    async fn test_generate_merges_config() {
        let ctl = controller(FakeGenerator::default(), false);
        ctl.set_input_text(SOURCE);
        ctl.configure(|c| {
            c.num_slides = 3;
            c.template = Template::Dark;
            c.attach_title_image(TINY_PNG)
        })
        .unwrap();

        assert_eq!(ctl.generate().await, Dispatch::Settled(Status::Success));

        let presentation = ctl.snapshot().presentation.unwrap();
        assert_eq!(presentation.slides.len(), 3);
        assert_eq!(presentation.template, Template::Dark);
        assert!(presentation.title_image.is_some());
    }

    #[tokio::test]
    async fn test_failed_configure_leaves_config() {
        let ctl = controller(FakeGenerator::default(), false);
        let err = ctl
            .configure(|c| {
                c.num_slides = 9;
                c.attach_title_image(b"not an image")
            })
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert_eq!(ctl.snapshot().config, GenerationConfig::default());
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_no_presentation() {
        let generator = FakeGenerator {
            fail: true,
            ..Default::default()
        };
        let ctl = controller(generator, false);
        ctl.set_input_text(SOURCE);

        assert_eq!(ctl.generate().await, Dispatch::Settled(Status::Error));
        let state = ctl.snapshot();
        assert!(state.presentation.is_none());
        assert!(matches!(state.error, Some(Error::GenerationFailed(_))));
        assert_eq!(state.input_text, SOURCE);
    }

    #[tokio::test]
    async fn test_duplicate_generate_is_ignored() {
        let gate = Arc::new(Notify::new());
        let generator = FakeGenerator {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let ctl = controller(generator.clone(), false);
        ctl.set_input_text(SOURCE);

        let first = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.generate().await }
        });
        while ctl.status() != Status::GeneratingContent {
            tokio::task::yield_now().await;
        }

        assert!(ctl.generate().await.is_ignored());
        assert!(ctl.ingest(SOURCE.as_bytes().to_vec(), "text/plain").await.is_ignored());
        assert!(ctl.set_input_text("other").is_ignored());

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Dispatch::Settled(Status::Success));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_result_after_reset_is_discarded() {
        let gate = Arc::new(Notify::new());
        let generator = FakeGenerator {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let ctl = controller(generator, false);
        ctl.set_input_text(SOURCE);

        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.generate().await }
        });
        while ctl.status() != Status::GeneratingContent {
            tokio::task::yield_now().await;
        }

        ctl.reset();
        gate.notify_one();

        assert!(pending.await.unwrap().is_ignored());
        let state = ctl.snapshot();
        assert_eq!(state.status, Status::Idle);
        assert!(state.presentation.is_none());
    }

    #[tokio::test]
    async fn test_edits_replace_presentation() {
        let ctl = generated(FakeGenerator::default(), false).await;

        assert_eq!(
            ctl.attach_slide_image(0, TINY_PNG).unwrap(),
            Dispatch::Settled(Status::Success)
        );
        assert!(ctl.snapshot().presentation.unwrap().slides[0].image.is_some());

        ctl.remove_slide_image(0).unwrap();
        ctl.apply_template("corporate").unwrap();
        let presentation = ctl.snapshot().presentation.unwrap();
        assert!(presentation.slides[0].image.is_none());
        assert_eq!(presentation.template, Template::Corporate);

        ctl.attach_title_image(TINY_PNG).unwrap();
        assert!(ctl.snapshot().presentation.unwrap().title_image.is_some());
        ctl.remove_title_image().unwrap();
        assert!(ctl.snapshot().presentation.unwrap().title_image.is_none());
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_presentation() {
        let ctl = generated(FakeGenerator::default(), false).await;
        let before = ctl.snapshot();

        assert!(ctl.attach_slide_image(99, TINY_PNG).is_err());
        assert!(ctl.attach_slide_image(0, b"text").is_err());
        assert_eq!(ctl.snapshot(), before);
    }

    #[tokio::test]
    async fn test_edits_without_presentation_are_ignored() {
        let ctl = controller(FakeGenerator::default(), false);
        assert!(ctl.apply_template("dark").unwrap().is_ignored());
        assert!(ctl.export().await.is_ignored());
    }

    #[tokio::test]
    async fn test_export_success() {
        let ctl = generated(FakeGenerator::default(), false).await;

        let file = ctl.export().await.settled().unwrap().unwrap();
        assert_eq!(file.file_name, "Photosynthesis.pptx");
        assert_eq!(ctl.status(), Status::Success);
    }

    #[tokio::test]
    async fn test_export_failure_keeps_presentation() {
        let ctl = generated(FakeGenerator::default(), true).await;

        let result = ctl.export().await.settled().unwrap();
        assert!(matches!(result, Err(Error::ExportFailed(_))));

        let state = ctl.snapshot();
        assert_eq!(state.status, Status::Error);
        assert!(state.presentation.is_some());
        assert!(matches!(state.error, Some(Error::ExportFailed(_))));
    }

    #[tokio::test]
    async fn test_ingest_after_failed_export_is_ignored() {
        let ctl = generated(FakeGenerator::default(), true).await;
        ctl.export().await;
        assert_eq!(ctl.status(), Status::Error);

        let other = "Mitochondria produce most of the chemical energy a cell needs.";
        let dispatch = ctl.ingest(other.as_bytes().to_vec(), "text/plain").await;
        assert_eq!(dispatch, Dispatch::Ignored);

        let state = ctl.snapshot();
        assert_eq!(state.status, Status::Error);
        assert_eq!(state.input_text, SOURCE);
        assert!(state.presentation.is_some());
        assert!(matches!(state.error, Some(Error::ExportFailed(_))));

        ctl.reset();
        let dispatch = ctl.ingest(other.as_bytes().to_vec(), "text/plain").await;
        assert_eq!(dispatch, Dispatch::Settled(Status::Idle));
        assert_eq!(ctl.snapshot().input_text, other);
    }

    #[tokio::test]
    async fn test_reset_postcondition() {
        let ctl = controller(FakeGenerator::default(), false);
        ctl.configure(|c| {
            c.audience = deck_core::Audience::Executive;
            c.template = Template::Modern;
            c.attach_title_image(TINY_PNG)
        })
        .unwrap();
        ctl.set_input_text(SOURCE);
        ctl.generate().await;

        assert_eq!(ctl.reset(), Dispatch::Settled(Status::Idle));

        let state = ctl.snapshot();
        assert_eq!(state.status, Status::Idle);
        assert!(state.input_text.is_empty());
        assert!(state.presentation.is_none());
        assert!(state.error.is_none());
        assert!(state.config.title_image.is_none());
        assert_eq!(state.config.audience, deck_core::Audience::Executive);
        assert_eq!(state.config.template, Template::Modern);
    }
}
