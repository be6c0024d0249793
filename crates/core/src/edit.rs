//! Edit surface for a generated presentation.
//!
//! Every operation borrows the current value and returns a new one, so earlier
//! values stay untouched and can be compared against later ones.

use crate::{DeckContent, Error, GenerationConfig, ImageRef, Presentation, Result, Template};

/// Combine generator output with the visual settings of the config.
pub fn merge(content: DeckContent, config: &GenerationConfig) -> Presentation {
    Presentation {
        title: content.title,
        subtitle: content.subtitle,
        slides: content.slides,
        template: config.template,
        title_image: config.title_image.clone(),
    }
}

impl Presentation {
    /// Attach an image to the slide at `index`.
    pub fn attach_slide_image(&self, index: usize, image_bytes: &[u8]) -> Result<Self> {
        let image = ImageRef::from_bytes(image_bytes)?;
        self.with_slide_image(index, Some(image))
    }

    /// Remove the image from the slide at `index`, if any.
    pub fn remove_slide_image(&self, index: usize) -> Result<Self> {
        self.with_slide_image(index, None)
    }

    /// Attach an image to the title slide.
    pub fn attach_title_image(&self, image_bytes: &[u8]) -> Result<Self> {
        let image = ImageRef::from_bytes(image_bytes)?;
        Ok(Self {
            title_image: Some(image),
            ..self.clone()
        })
    }

    /// Remove the title slide image, if any.
    pub fn remove_title_image(&self) -> Self {
        Self {
            title_image: None,
            ..self.clone()
        }
    }

    /// Switch the visual theme. Unknown identifiers select classic.
    pub fn apply_template(&self, id: &str) -> Self {
        Self {
            template: Template::parse(id),
            ..self.clone()
        }
    }

    fn with_slide_image(&self, index: usize, image: Option<ImageRef>) -> Result<Self> {
        if index >= self.slides.len() {
            return Err(Error::Unexpected(format!(
                "slide index {} out of range ({} slides)",
                index,
                self.slides.len()
            )));
        }

        let mut next = self.clone();
        next.slides[index].image = image;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::TINY_PNG;
    use crate::Slide;

    fn sample() -> Presentation {
        let content = DeckContent {
            title: "Solar Power".to_string(),
            subtitle: Some("An overview".to_string()),
            slides: vec![
                Slide::new("Why solar", vec!["Cheap".into(), "Clean".into()], "notes"),
                Slide::new("How it works", vec!["Photons".into()], ""),
            ],
        };
        merge(content, &GenerationConfig::default())
    }

    #[test]
    fn test_merge_applies_visual_config() {
        let content = DeckContent {
            title: "T".into(),
            subtitle: None,
            slides: vec![],
        };
        let mut config = GenerationConfig {
            template: Template::Modern,
            ..Default::default()
        };
        config.attach_title_image(TINY_PNG).unwrap();

        let p = merge(content, &config);
        assert_eq!(p.template, Template::Modern);
        assert_eq!(p.title_image, config.title_image);
        assert!(p.slides.is_empty());
    }

    #[test]
    fn test_attach_then_remove_slide_image_round_trip() {
        let original = sample();
        let with_image = original.attach_slide_image(1, TINY_PNG).unwrap();
        assert!(with_image.slides[1].image.is_some());
        assert!(with_image.slides[0].image.is_none());

        let without = with_image.remove_slide_image(1).unwrap();
        assert!(without.slides[1].image.is_none());
        assert_eq!(without, original);
    }

    #[test]
    fn test_edit_leaves_previous_value_untouched() {
        let original = sample();
        let _edited = original.attach_slide_image(0, TINY_PNG).unwrap();
        assert!(original.slides[0].image.is_none());
    }

    #[test]
    fn test_slide_index_out_of_range() {
        let err = sample().attach_slide_image(2, TINY_PNG).unwrap_err();
        assert!(matches!(err, Error::Unexpected(_)));
        assert!(sample().remove_slide_image(9).is_err());
    }

    #[test]
    fn test_attach_non_image_rejected() {
        let err = sample().attach_slide_image(0, b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_title_image_round_trip() {
        let original = sample();
        let with_image = original.attach_title_image(TINY_PNG).unwrap();
        assert!(with_image.title_image.is_some());
        assert_eq!(with_image.remove_title_image(), original);
    }

    #[test]
    fn test_apply_template() {
        let p = sample().apply_template("dark");
        assert_eq!(p.template, Template::Dark);
        let p = p.apply_template("vaporwave");
        assert_eq!(p.template, Template::Classic);
    }
}
