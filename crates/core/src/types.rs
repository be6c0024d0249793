//! Domain types for representing a generated slide deck.

use crate::ImageRef;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single content slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Short heading shown at the top of the slide.
    pub title: String,

    /// Bullet points in display order.
    pub bullet_points: Vec<String>,

    /// Presenter notes; not shown on the slide body.
    #[serde(default)]
    pub speaker_notes: String,

    /// Optional picture shown next to the bullets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Slide {
    /// Create a slide without an image.
    pub fn new(
        title: impl Into<String>,
        bullet_points: Vec<String>,
        speaker_notes: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            bullet_points,
            speaker_notes: speaker_notes.into(),
            image: None,
        }
    }
}

/// Content produced by the generator: a deck without any visual settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub slides: Vec<Slide>,
}

/// The full in-memory slide deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Deck title, shown on the title slide.
    pub title: String,

    /// Optional line under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Content slides in presentation order.
    pub slides: Vec<Slide>,

    /// Visual theme applied at export time.
    #[serde(default)]
    pub template: Template,

    /// Optional picture on the title slide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_image: Option<ImageRef>,
}

impl Presentation {
    /// Number of slides in the exported file, title slide included.
    pub fn exported_slide_count(&self) -> usize {
        self.slides.len() + 1
    }
}

/// Visual theme identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Classic,
    Modern,
    Dark,
    Corporate,
}

impl Template {
    /// All known templates, in menu order.
    pub const ALL: [Template; 4] = [
        Template::Classic,
        Template::Modern,
        Template::Dark,
        Template::Corporate,
    ];

    /// Normalize a template identifier. Unknown identifiers fall back to classic.
    pub fn parse(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "modern" => Self::Modern,
            "dark" => Self::Dark,
            "corporate" => Self::Corporate,
            "classic" => Self::Classic,
            other => {
                log::debug!("Unknown template '{}', using classic", other);
                Self::Classic
            }
        }
    }

    /// The identifier used in serialized form.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Dark => "dark",
            Self::Corporate => "corporate",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(Self::parse(&id))
    }
}

/// How much detail the generator should put on each slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Brief,
    #[default]
    Detailed,
}

impl DetailLevel {
    /// Phrase used when instructing the generator.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Brief => "brief and concise, one short phrase per bullet",
            Self::Detailed => "detailed, with complete explanatory bullets",
        }
    }
}

/// Who the deck is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Academic,
    #[default]
    General,
    Executive,
}

impl Audience {
    /// Phrase used when instructing the generator.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Academic => "an academic audience of researchers and students",
            Self::General => "a general audience without specialist background",
            Self::Executive => "executives who need key findings and decisions",
        }
    }
}

/// Options for a generation run.
///
/// `template` and `title_image` are never sent to the generator; they are
/// applied when its result is merged into a [`Presentation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Target slide count. Advisory only.
    pub num_slides: u32,
    pub detail_level: DetailLevel,
    pub audience: Audience,
    #[serde(default)]
    pub template: Template,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_image: Option<ImageRef>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            num_slides: 5,
            detail_level: DetailLevel::default(),
            audience: Audience::default(),
            template: Template::default(),
            title_image: None,
        }
    }
}

impl GenerationConfig {
    /// Set the title image chosen before generation.
    pub fn attach_title_image(&mut self, bytes: &[u8]) -> crate::Result<()> {
        self.title_image = Some(ImageRef::from_bytes(bytes)?);
        Ok(())
    }

    /// Clear the title image chosen before generation.
    pub fn remove_title_image(&mut self) {
        self.title_image = None;
    }
}
