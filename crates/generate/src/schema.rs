//! Response schema and shape-checking of generated decks.

use deck_core::{DeckContent, Error, Result, Slide};
use serde::Deserialize;
use serde_json::{json, Value};

/// Schema the content service must follow when answering.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "subtitle": { "type": "STRING" },
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "bulletPoints": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" }
                        },
                        "speakerNotes": { "type": "STRING" }
                    },
                    "required": ["title", "bulletPoints", "speakerNotes"]
                }
            }
        },
        "required": ["title", "slides"]
    })
}

/// Deck as returned on the wire. Every slide field is required here,
/// unlike the looser domain type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDeck {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    slides: Vec<WireSlide>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSlide {
    title: String,
    bullet_points: Vec<String>,
    speaker_notes: String,
}

/// Parse the service's JSON answer into deck content.
///
/// Only the shape is checked; slide and bullet counts are accepted as given.
pub fn parse_deck(raw: &str) -> Result<DeckContent> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(Error::GenerationFailed(
            "the service returned an empty response".to_string(),
        ));
    }

    let deck: WireDeck = serde_json::from_str(body).map_err(|e| {
        Error::GenerationFailed(format!("response did not match the expected shape: {}", e))
    })?;

    if deck.title.trim().is_empty() {
        return Err(Error::GenerationFailed("deck title is empty".to_string()));
    }

    for (idx, slide) in deck.slides.iter().enumerate() {
        if slide.title.trim().is_empty() {
            return Err(Error::GenerationFailed(format!(
                "slide {} has an empty title",
                idx + 1
            )));
        }
        if slide.bullet_points.is_empty() {
            return Err(Error::GenerationFailed(format!(
                "slide {} has no bullet points",
                idx + 1
            )));
        }
    }

    Ok(DeckContent {
        title: deck.title,
        subtitle: deck.subtitle.filter(|s| !s.trim().is_empty()),
        slides: deck
            .slides
            .into_iter()
            .map(|s| Slide::new(s.title, s.bullet_points, s.speaker_notes))
            .collect(),
    })
}

/// Remove a surrounding Markdown code fence, if the service added one.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip an optional language tag on the opening line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "title": "Remote Work",
        "subtitle": "What the data says",
        "slides": [
            {"title": "Background", "bulletPoints": ["Trend", "Scope", "Method"], "speakerNotes": "Set the scene."},
            {"title": "Findings", "bulletPoints": ["Output stable"], "speakerNotes": ""}
        ]
    }"#;

    #[test]
    fn test_parse_valid_deck() {
        let deck = parse_deck(VALID).unwrap();
        assert_eq!(deck.title, "Remote Work");
        assert_eq!(deck.subtitle.as_deref(), Some("What the data says"));
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].bullet_points.len(), 3);
        assert_eq!(deck.slides[1].speaker_notes, "");
        assert!(deck.slides.iter().all(|s| s.image.is_none()));
    }

    #[test]
    fn test_slide_count_not_corrected() {
        let json = r#"{"title":"T","slides":[]}"#;
        let deck = parse_deck(json).unwrap();
        assert!(deck.slides.is_empty());
        assert!(deck.subtitle.is_none());
    }

    #[test]
    fn test_code_fence_stripped() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert_eq!(parse_deck(&fenced).unwrap().title, "Remote Work");
    }

    #[test]
    fn test_missing_required_fields() {
        let no_slides = r#"{"title":"T"}"#;
        let no_notes = r#"{"title":"T","slides":[{"title":"S","bulletPoints":["a"]}]}"#;
        for raw in [no_slides, no_notes] {
            let err = parse_deck(raw).unwrap_err();
            assert!(matches!(err, Error::GenerationFailed(_)), "{}", raw);
        }
    }

    #[test]
    fn test_empty_and_garbage_responses() {
        for raw in ["", "   ", "not json", "[1,2,3]"] {
            assert!(matches!(
                parse_deck(raw),
                Err(Error::GenerationFailed(_))
            ));
        }
    }

    #[test]
    fn test_shape_checks() {
        let blank_title = r#"{"title":"  ","slides":[]}"#;
        let blank_slide = r#"{"title":"T","slides":[{"title":"","bulletPoints":["a"],"speakerNotes":""}]}"#;
        let no_bullets = r#"{"title":"T","slides":[{"title":"S","bulletPoints":[],"speakerNotes":""}]}"#;
        for raw in [blank_title, blank_slide, no_bullets] {
            assert!(parse_deck(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_schema_requires_fields() {
        let schema = response_schema();
        assert_eq!(schema["required"], json!(["title", "slides"]));
        assert_eq!(
            schema["properties"]["slides"]["items"]["required"],
            json!(["title", "bulletPoints", "speakerNotes"])
        );
    }
}
