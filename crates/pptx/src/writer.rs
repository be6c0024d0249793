//! PPTX export of a presentation.

use crate::package::{self, Relationship, SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::theme::Palette;
use crate::xml::{notes_xml, Align, Anchor, Paragraph, Rect, SlideXml, XmlResult};
use deck_core::{Error, ImageRef, Presentation, Result, Slide};
use regex::Regex;
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Characters that are unsafe in file names on common platforms.
static UNSAFE_FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1F]+"#).unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const MAX_FILENAME_CHARS: usize = 100;

const MARGIN: i64 = 457_200;
const CONTENT_WIDTH: i64 = SLIDE_WIDTH - 2 * MARGIN;

// Title slide layout
const COVER_TEXT_X: i64 = 2 * MARGIN;
const COVER_TEXT_WIDTH: i64 = SLIDE_WIDTH - 4 * MARGIN;
const COVER_TEXT_WIDTH_WITH_IMAGE: i64 = 6_400_800;
const COVER_TITLE_Y: i64 = 1_371_600;
const COVER_TITLE_HEIGHT: i64 = 1_874_520;
const COVER_BAR_Y: i64 = 3_337_560;
const COVER_BAR_WIDTH: i64 = 1_828_800;
const COVER_SUBTITLE_Y: i64 = 3_520_440;
const COVER_IMAGE: Rect = Rect::new(7_772_400, 1_143_000, 3_962_400, 4_572_000);

// Content slide layout
const TITLE_FRAME: Rect = Rect::new(MARGIN, 365_760, CONTENT_WIDTH, 914_400);
const TITLE_BAR: Rect = Rect::new(MARGIN, 1_325_880, 1_371_600, 45_720);
const BODY_Y: i64 = 1_554_480;
const BODY_HEIGHT: i64 = SLIDE_HEIGHT - BODY_Y - MARGIN;
const BODY_WIDTH_WITH_IMAGE: i64 = 6_217_920;
const SLIDE_IMAGE: Rect = Rect::new(6_949_440, BODY_Y, 4_785_360, BODY_HEIGHT);

const BULLET: &str = "\u{2022}";

/// Writer for `.pptx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxExporter;

impl PptxExporter {
    /// Create a new PPTX exporter.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a presentation: a title slide followed by one slide per
    /// content slide.
    ///
    /// Either the complete file is returned or an [`Error::ExportFailed`].
    pub fn export(&self, presentation: &Presentation) -> Result<Vec<u8>> {
        let palette = Palette::for_template(presentation.template);
        let mut media = MediaStore::default();
        let mut parts = Vec::with_capacity(presentation.exported_slide_count());

        let cover_image = presentation
            .title_image
            .as_ref()
            .map(|img| media.add(img, "title slide"))
            .transpose()?;
        parts.push(
            title_slide(presentation, palette, cover_image)
                .map_err(|e| xml_error(e, "title slide"))?,
        );

        for (idx, slide) in presentation.slides.iter().enumerate() {
            let location = format!("slide {}", idx + 1);
            let image = slide
                .image
                .as_ref()
                .map(|img| media.add(img, &location))
                .transpose()?;
            parts.push(content_slide(slide, palette, image).map_err(|e| xml_error(e, &location))?);
        }

        let bytes = write_package(presentation, &parts, &media)?;

        log::debug!(
            "Exported '{}': {} slides, {} images, {} bytes",
            presentation.title,
            parts.len(),
            media.items.len(),
            bytes.len()
        );

        Ok(bytes)
    }
}

/// Suggested download name for a presentation.
pub fn file_name_for(presentation: &Presentation) -> String {
    let cleaned = UNSAFE_FILENAME_REGEX.replace_all(&presentation.title, " ");
    let cleaned = WHITESPACE_REGEX.replace_all(&cleaned, " ");
    let stem: String = cleaned
        .trim()
        .trim_matches('.')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();
    let stem = stem.trim();

    if stem.is_empty() {
        "presentation.pptx".to_string()
    } else {
        format!("{}.pptx", stem)
    }
}

/// An image stored under `ppt/media/`.
struct MediaItem {
    file_name: String,
    bytes: Vec<u8>,
    extension: &'static str,
}

#[derive(Default)]
struct MediaStore {
    items: Vec<MediaItem>,
}

/// Where a stored image should be drawn.
struct PlacedImage {
    file_name: String,
    pixels: Option<(u32, u32)>,
}

impl MediaStore {
    /// Store an image and return its placement handle.
    fn add(&mut self, image: &ImageRef, location: &str) -> Result<PlacedImage> {
        let extension = match image.mime() {
            "image/png" => "png",
            "image/jpeg" => "jpeg",
            "image/gif" => "gif",
            other => {
                return Err(Error::ExportFailed(format!(
                    "unsupported image encoding '{}' on {}; use PNG, JPEG or GIF",
                    other, location
                )))
            }
        };

        let bytes = image
            .decode()
            .map_err(|e| Error::ExportFailed(format!("image on {} is corrupt: {}", location, e)))?;

        let file_name = format!("image{}.{}", self.items.len() + 1, extension);
        self.items.push(MediaItem {
            file_name: file_name.clone(),
            bytes,
            extension,
        });

        Ok(PlacedImage {
            file_name,
            pixels: image.dimensions(),
        })
    }

    fn extensions(&self) -> BTreeSet<&str> {
        self.items.iter().map(|m| m.extension).collect()
    }
}

/// A rendered slide with its relationships.
struct SlidePart {
    xml: Vec<u8>,
    image: Option<String>,
    notes: Option<Vec<u8>>,
}

const IMAGE_REL: &str = "rId2";
const NOTES_REL: &str = "rId3";

fn title_slide(
    presentation: &Presentation,
    palette: Palette,
    image: Option<PlacedImage>,
) -> XmlResult<SlidePart> {
    let mut slide = SlideXml::new(palette)?;
    // Centered cover unless an image takes the right half
    let (text_width, align, bar_x) = if image.is_some() {
        (COVER_TEXT_WIDTH_WITH_IMAGE, Align::Left, COVER_TEXT_X)
    } else {
        (
            COVER_TEXT_WIDTH,
            Align::Center,
            (SLIDE_WIDTH - COVER_BAR_WIDTH) / 2,
        )
    };

    slide.text_box(
        "Title",
        Rect::new(COVER_TEXT_X, COVER_TITLE_Y, text_width, COVER_TITLE_HEIGHT),
        Anchor::Bottom,
        &[Paragraph {
            text: &presentation.title,
            size: 4400,
            bold: true,
            color: palette.title,
            bullet: None,
            align,
        }],
    )?;
    slide.accent_bar(Rect::new(bar_x, COVER_BAR_Y, COVER_BAR_WIDTH, 54_864))?;

    if let Some(subtitle) = presentation.subtitle.as_deref().filter(|s| !s.is_empty()) {
        slide.text_box(
            "Subtitle",
            Rect::new(COVER_TEXT_X, COVER_SUBTITLE_Y, text_width, 1_097_280),
            Anchor::Top,
            &[Paragraph {
                text: subtitle,
                size: 2400,
                bold: false,
                color: palette.text,
                bullet: None,
                align,
            }],
        )?;
    }

    let image = match image {
        Some(placed) => {
            slide.picture(IMAGE_REL, COVER_IMAGE.fit(placed.pixels))?;
            Some(placed.file_name)
        }
        None => None,
    };

    Ok(SlidePart {
        xml: slide.finish()?,
        image,
        notes: None,
    })
}

fn content_slide(slide: &Slide, palette: Palette, image: Option<PlacedImage>) -> XmlResult<SlidePart> {
    let mut xml = SlideXml::new(palette)?;

    xml.text_box(
        "Title",
        TITLE_FRAME,
        Anchor::Middle,
        &[Paragraph {
            text: &slide.title,
            size: 3200,
            bold: true,
            color: palette.title,
            bullet: None,
            align: Align::Left,
        }],
    )?;
    xml.accent_bar(TITLE_BAR)?;

    if !slide.bullet_points.is_empty() {
        let body_width = if image.is_some() {
            BODY_WIDTH_WITH_IMAGE
        } else {
            CONTENT_WIDTH
        };
        let size = if slide.bullet_points.len() > 5 { 1800 } else { 2000 };
        let paragraphs: Vec<Paragraph<'_>> = slide
            .bullet_points
            .iter()
            .map(|point| Paragraph {
                text: point,
                size,
                bold: false,
                color: palette.text,
                bullet: Some(BULLET),
                align: Align::Left,
            })
            .collect();

        xml.text_box(
            "Content",
            Rect::new(MARGIN, BODY_Y, body_width, BODY_HEIGHT),
            Anchor::Top,
            &paragraphs,
        )?;
    }

    let image = match image {
        Some(placed) => {
            xml.picture(IMAGE_REL, SLIDE_IMAGE.fit(placed.pixels))?;
            Some(placed.file_name)
        }
        None => None,
    };

    let notes = if slide.speaker_notes.trim().is_empty() {
        None
    } else {
        Some(notes_xml(&slide.speaker_notes)?)
    };

    Ok(SlidePart {
        xml: xml.finish()?,
        image,
        notes,
    })
}

fn slide_rels(number: usize, part: &SlidePart) -> String {
    let mut rels = vec![Relationship::new(
        "rId1",
        "slideLayout",
        "../slideLayouts/slideLayout1.xml",
    )];
    if let Some(file_name) = &part.image {
        rels.push(Relationship::new(
            IMAGE_REL,
            "image",
            format!("../media/{}", file_name),
        ));
    }
    if part.notes.is_some() {
        rels.push(Relationship::new(
            NOTES_REL,
            "notesSlide",
            format!("../notesSlides/notesSlide{}.xml", number),
        ));
    }
    package::relationships(&rels)
}

fn notes_rels(number: usize) -> String {
    package::relationships(&[
        Relationship::new("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
        Relationship::new("rId2", "slide", format!("../slides/slide{}.xml", number)),
    ])
}

fn write_package(
    presentation: &Presentation,
    parts: &[SlidePart],
    media: &MediaStore,
) -> Result<Vec<u8>> {
    let notes: Vec<usize> = parts
        .iter()
        .enumerate()
        .filter(|(_, p)| p.notes.is_some())
        .map(|(idx, _)| idx + 1)
        .collect();

    let mut zip = PackageWriter::new();

    zip.add(
        "[Content_Types].xml",
        package::content_types(parts.len(), &notes, &media.extensions()).as_bytes(),
    )?;
    zip.add("_rels/.rels", package::ROOT_RELS.as_bytes())?;
    zip.add(
        "docProps/core.xml",
        package::core_properties(&presentation.title).as_bytes(),
    )?;
    zip.add(
        "docProps/app.xml",
        package::app_properties(parts.len(), notes.len()).as_bytes(),
    )?;
    zip.add(
        "ppt/presentation.xml",
        package::presentation(parts.len()).as_bytes(),
    )?;
    zip.add(
        "ppt/_rels/presentation.xml.rels",
        package::presentation_rels(parts.len()).as_bytes(),
    )?;
    zip.add("ppt/slideMasters/slideMaster1.xml", package::SLIDE_MASTER.as_bytes())?;
    zip.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        package::SLIDE_MASTER_RELS.as_bytes(),
    )?;
    zip.add("ppt/slideLayouts/slideLayout1.xml", package::SLIDE_LAYOUT.as_bytes())?;
    zip.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        package::SLIDE_LAYOUT_RELS.as_bytes(),
    )?;
    zip.add("ppt/notesMasters/notesMaster1.xml", package::NOTES_MASTER.as_bytes())?;
    zip.add(
        "ppt/notesMasters/_rels/notesMaster1.xml.rels",
        package::NOTES_MASTER_RELS.as_bytes(),
    )?;
    zip.add("ppt/theme/theme1.xml", package::THEME.as_bytes())?;
    zip.add("ppt/theme/theme2.xml", package::THEME.as_bytes())?;

    for (idx, part) in parts.iter().enumerate() {
        let number = idx + 1;
        zip.add(&format!("ppt/slides/slide{}.xml", number), &part.xml)?;
        zip.add(
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            slide_rels(number, part).as_bytes(),
        )?;
        if let Some(notes) = &part.notes {
            zip.add(&format!("ppt/notesSlides/notesSlide{}.xml", number), notes)?;
            zip.add(
                &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", number),
                notes_rels(number).as_bytes(),
            )?;
        }
    }

    for item in &media.items {
        zip.add_stored(&format!("ppt/media/{}", item.file_name), &item.bytes)?;
    }

    zip.finish()
}

/// Thin wrapper mapping zip and I/O failures to export errors.
struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn add(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.write(path, bytes, CompressionMethod::Deflated)
    }

    /// Media is already compressed.
    fn add_stored(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.write(path, bytes, CompressionMethod::Stored)
    }

    fn write(&mut self, path: &str, bytes: &[u8], method: CompressionMethod) -> Result<()> {
        let options = FileOptions::default().compression_method(method);
        self.zip
            .start_file(path, options)
            .map_err(|e| Error::ExportFailed(format!("could not add '{}': {}", path, e)))?;
        self.zip
            .write_all(bytes)
            .map_err(|e| Error::ExportFailed(format!("could not write '{}': {}", path, e)))
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| Error::ExportFailed(format!("could not finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

fn xml_error(e: quick_xml::Error, location: &str) -> Error {
    Error::ExportFailed(format!("could not write {}: {}", location, e))
}
