//! Color palettes for the presentation templates.

use deck_core::Template;

/// Colors and font applied to every slide of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Slide background, as an RRGGBB hex string.
    pub background: &'static str,
    /// Title text color.
    pub title: &'static str,
    /// Body and subtitle text color.
    pub text: &'static str,
    /// Accent bar and bullet color.
    pub accent: &'static str,
    /// Latin typeface for all text.
    pub font: &'static str,
}

impl Palette {
    /// Palette for a template.
    pub fn for_template(template: Template) -> Self {
        match template {
            Template::Classic => Self {
                background: "FFFFFF",
                title: "1F2937",
                text: "374151",
                accent: "2563EB",
                font: "Calibri",
            },
            Template::Modern => Self {
                background: "F8FAFC",
                title: "0F172A",
                text: "334155",
                accent: "8B5CF6",
                font: "Segoe UI",
            },
            Template::Dark => Self {
                background: "111827",
                title: "F9FAFB",
                text: "D1D5DB",
                accent: "38BDF8",
                font: "Calibri",
            },
            Template::Corporate => Self {
                background: "FFFFFF",
                title: "1E3A5F",
                text: "2D3748",
                accent: "C8102E",
                font: "Arial",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_has_distinct_palette() {
        let palettes: Vec<Palette> = Template::ALL.iter().map(|t| Palette::for_template(*t)).collect();
        for (i, a) in palettes.iter().enumerate() {
            for b in &palettes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_colors_are_hex() {
        for template in Template::ALL {
            let p = Palette::for_template(template);
            for color in [p.background, p.title, p.text, p.accent] {
                assert_eq!(color.len(), 6);
                assert!(color.chars().all(|c| c.is_ascii_hexdigit()));
            }
        }
    }
}
