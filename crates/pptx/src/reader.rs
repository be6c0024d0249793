//! PPTX outline reader.
//!
//! Reads back the text, pictures and speaker notes of each slide of a
//! `.pptx` file, in presentation order. Used to inspect exported decks.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Slides of a presentation file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckOutline {
    pub slides: Vec<SlideOutline>,
}

/// Content of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideOutline {
    /// 1-based position in the presentation.
    pub number: usize,
    /// Text of each shape, top-to-bottom then left-to-right. Paragraphs of a
    /// shape are separated by newlines.
    pub texts: Vec<String>,
    pub picture_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SlideOutline {
    /// The first shape's text, normally the slide title.
    pub fn title(&self) -> Option<&str> {
        self.texts.first().map(String::as_str)
    }
}

/// Reader for `.pptx` files.
pub struct PptxReader;

impl PptxReader {
    pub fn new() -> Self {
        Self
    }

    /// Read the outline of a PPTX file.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<DeckOutline> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::UnsupportedFormat(format!("not a PPTX package: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        let mut outline = DeckOutline::default();

        for (idx, slide_path) in slide_paths.iter().enumerate() {
            let slide = self.read_slide(&mut archive, slide_path, idx + 1)?;
            outline.slides.push(slide);
        }

        log::debug!("Read {} slides", outline.slides.len());
        Ok(outline)
    }

    /// Slide part paths in presentation order.
    ///
    /// The `sldIdLst` of `presentation.xml` decides the order; relationship
    /// ids are used when that list is missing.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_part(archive, PRESENTATION_RELS_PATH)?;
        let slide_rels: Vec<RelEntry> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| is_slide_relationship(&rel.kind))
            .collect();

        let listed = match read_part(archive, PRESENTATION_PATH) {
            Ok(content) => listed_slide_ids(&content)?,
            Err(_) => Vec::new(),
        };

        if !listed.is_empty() {
            let targets: HashMap<&str, &str> = slide_rels
                .iter()
                .map(|rel| (rel.id.as_str(), rel.target.as_str()))
                .collect();
            return Ok(listed
                .iter()
                .filter_map(|id| targets.get(id.as_str()))
                .map(|target| resolve_target("ppt", target))
                .collect());
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|rel| {
                let order = extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target("ppt", &rel.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        number: usize,
    ) -> Result<SlideOutline> {
        let content = read_part(archive, slide_path)?;
        let mut shapes = extract_shapes(&content)?;

        // Top-to-bottom, then left-to-right
        shapes.sort_by(|a, b| (a.y, a.x).cmp(&(b.y, b.x)));

        let picture_count = shapes.iter().filter(|s| s.is_picture).count();
        let texts = shapes
            .into_iter()
            .filter(|s| !s.text.is_empty())
            .map(|s| s.text)
            .collect();

        Ok(SlideOutline {
            number,
            texts,
            picture_count,
            notes: self.read_notes(archive, slide_path)?,
        })
    }

    /// Notes text of a slide, found through the slide's relationships.
    fn read_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file) = split_path(slide_path);
        let rels_path = format!("{}/_rels/{}.rels", dir, file);

        // Slides without relationships have no notes
        let Ok(rels_content) = read_part(archive, &rels_path) else {
            return Ok(None);
        };

        let Some(notes_rel) = parse_relationships(&rels_content)?
            .into_iter()
            .find(|rel| rel.kind.ends_with("/notesSlide"))
        else {
            return Ok(None);
        };

        let notes_content = read_part(archive, &resolve_target(dir, &notes_rel.target))?;
        let text = extract_shapes(&notes_content)?
            .into_iter()
            .map(|s| s.text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// A shape's text and position.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: i64,
    y: i64,
    is_picture: bool,
}

/// An entry of a `.rels` part.
#[derive(Debug)]
struct RelEntry {
    id: String,
    kind: String,
    target: String,
}

fn parse_relationships(xml: &str) -> Result<Vec<RelEntry>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                rels.push(RelEntry {
                    id: attribute(e, b"Id").unwrap_or_default(),
                    kind: attribute(e, b"Type").unwrap_or_default(),
                    target: attribute(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::EmptyOrUnreadable(format!(
                    "error parsing relationships: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(rels)
}

fn is_slide_relationship(kind: &str) -> bool {
    kind.ends_with("/slide")
}

/// Relationship ids of `p:sldId` entries, in list order.
fn listed_slide_ids(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = attribute(e, b"r:id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::EmptyOrUnreadable(format!(
                    "error parsing presentation: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract shapes with text and position from slide or notes XML.
fn extract_shapes(xml: &str) -> Result<Vec<ShapeInfo>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut paragraphs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current_shape = Some(ShapeInfo::default()),
                b"pic" => {
                    current_shape = Some(ShapeInfo {
                        is_picture: true,
                        ..Default::default()
                    })
                }
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    in_paragraph = true;
                    paragraphs.push(String::new());
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == b"off" {
                    if let Some(ref mut shape) = current_shape {
                        shape.x = attribute(e, b"x").and_then(|v| v.parse().ok()).unwrap_or(0);
                        shape.y = attribute(e, b"y").and_then(|v| v.parse().ok()).unwrap_or(0);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().map_err(|err| {
                        Error::EmptyOrUnreadable(format!("invalid slide text: {}", err))
                    })?;
                    if let Some(last) = paragraphs.last_mut() {
                        last.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(mut shape) = current_shape.take() {
                        shape.text = paragraphs
                            .iter()
                            .map(|p| p.trim())
                            .filter(|p| !p.is_empty())
                            .collect::<Vec<_>>()
                            .join("\n");
                        shapes.push(shape);
                    }
                    paragraphs.clear();
                    in_text_body = false;
                    in_paragraph = false;
                }
                b"txBody" => in_text_body = false,
                b"p" => in_paragraph = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::EmptyOrUnreadable(format!(
                    "error parsing slide XML: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Read a part from the archive as text.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::EmptyOrUnreadable(format!("part '{}' not found: {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::EmptyOrUnreadable(format!("failed to read '{}': {}", path, e)))?;

    Ok(content)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Split a part path into its directory and file name.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
