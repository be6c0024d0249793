//! End-to-end: text upload, generation, editing and a real PPTX export read
//! back from the produced bytes.

use async_trait::async_trait;
use deck_app::{Controller, Dispatch, Generator, Status};
use deck_core::{DeckContent, GenerationConfig, Result, Slide, Template};
use deck_ingest::DocumentIngestor;
use deck_pptx::{PptxExporter, PptxReader};
use std::io::Cursor;
use std::sync::Arc;

const ARTICLE: &str = "The water cycle moves water between oceans, air and land. \
Evaporation lifts water vapour, condensation forms clouds, and precipitation \
returns water to the surface where it collects in rivers and aquifers.";

/// Generator returning a fixed three-slide deck.
struct CannedGenerator;

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate_deck(&self, text: String, _config: GenerationConfig) -> Result<DeckContent> {
        assert!(text.starts_with("The water cycle"));
        Ok(DeckContent {
            title: "The Water Cycle".to_string(),
            subtitle: Some("From sea to sky and back".to_string()),
            slides: vec![
                Slide::new(
                    "Evaporation",
                    vec!["Sun heats the ocean".into(), "Vapour rises".into()],
                    "Point at the diagram.",
                ),
                Slide::new("Condensation", vec!["Clouds form".into()], ""),
                Slide::new(
                    "Precipitation",
                    vec!["Rain".into(), "Snow".into(), "Hail".into()],
                    "Ask about local weather.",
                ),
            ],
        })
    }
}

#[tokio::test]
async fn test_upload_generate_edit_export() {
    let controller = Controller::new(
        Arc::new(DocumentIngestor::new()),
        CannedGenerator,
        PptxExporter::new(),
    );

    assert_eq!(
        controller
            .ingest(ARTICLE.as_bytes().to_vec(), "text/plain; charset=utf-8")
            .await,
        Dispatch::Settled(Status::Idle)
    );
    assert_eq!(controller.snapshot().input_text, ARTICLE);

    assert_eq!(controller.generate().await, Dispatch::Settled(Status::Success));
    controller.apply_template("dark").unwrap();

    let file = controller
        .export()
        .await
        .settled()
        .expect("export should run")
        .expect("export should succeed");
    assert_eq!(file.file_name, "The Water Cycle.pptx");

    let state = controller.snapshot();
    assert_eq!(state.status, Status::Success);
    assert_eq!(state.presentation.as_ref().map(|p| p.template), Some(Template::Dark));

    let outline = PptxReader::new().read(Cursor::new(file.bytes)).unwrap();
    assert_eq!(outline.slides.len(), 4);

    let titles: Vec<_> = outline.slides.iter().map(|s| s.title()).collect();
    assert_eq!(
        titles,
        vec![
            Some("The Water Cycle"),
            Some("Evaporation"),
            Some("Condensation"),
            Some("Precipitation"),
        ]
    );
    assert_eq!(outline.slides[1].notes.as_deref(), Some("Point at the diagram."));
    assert_eq!(outline.slides[2].notes, None);
    assert_eq!(outline.slides[3].texts[1], "Rain\nSnow\nHail");
}

#[tokio::test]
async fn test_unsupported_upload_keeps_previous_text() {
    let controller = Controller::new(
        Arc::new(DocumentIngestor::new()),
        CannedGenerator,
        PptxExporter::new(),
    );
    controller.set_input_text(ARTICLE);

    let dispatch = controller
        .ingest(b"GIF89a".to_vec(), "image/gif")
        .await;

    assert_eq!(dispatch, Dispatch::Settled(Status::Error));
    let state = controller.snapshot();
    assert_eq!(state.input_text, ARTICLE);
    assert!(state.error.is_some());
}
