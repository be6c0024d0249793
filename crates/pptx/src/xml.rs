//! Low-level PresentationML writers for slide and notes parts.

use crate::theme::Palette;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;

pub(crate) type XmlResult<T> = quick_xml::Result<T>;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// A shape frame in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    pub(crate) const fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Largest frame with the given pixel aspect ratio that fits inside this
    /// one, centered.
    pub(crate) fn fit(&self, pixels: Option<(u32, u32)>) -> Rect {
        let Some((w, h)) = pixels.filter(|(w, h)| *w > 0 && *h > 0) else {
            return *self;
        };

        let (w, h) = (w as i64, h as i64);
        // Compare aspect ratios without floating point: w/h vs cx/cy
        let (cx, cy) = if w * self.cy > h * self.cx {
            (self.cx, self.cx * h / w)
        } else {
            (self.cy * w / h, self.cy)
        };

        Rect {
            x: self.x + (self.cx - cx) / 2,
            y: self.y + (self.cy - cy) / 2,
            cx,
            cy,
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
}

impl Align {
    fn attr(&self) -> &'static str {
        match self {
            Self::Left => "l",
            Self::Center => "ctr",
        }
    }
}

/// Vertical text anchoring inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    Top,
    Middle,
    Bottom,
}

impl Anchor {
    fn attr(&self) -> &'static str {
        match self {
            Self::Top => "t",
            Self::Middle => "ctr",
            Self::Bottom => "b",
        }
    }
}

/// One paragraph of a text box, a single run of uniformly styled text.
#[derive(Debug, Clone)]
pub(crate) struct Paragraph<'a> {
    pub text: &'a str,
    /// Font size in hundredths of a point.
    pub size: u32,
    pub bold: bool,
    pub color: &'a str,
    pub bullet: Option<&'a str>,
    pub align: Align,
}

/// Streaming writer for one `p:sld` part.
pub(crate) struct SlideXml {
    w: Writer<Vec<u8>>,
    next_id: u32,
    palette: Palette,
}

impl SlideXml {
    /// Start a slide with the palette's background.
    pub(crate) fn new(palette: Palette) -> XmlResult<Self> {
        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        start(
            &mut w,
            "p:sld",
            &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
        )?;
        start(&mut w, "p:cSld", &[])?;

        start(&mut w, "p:bg", &[])?;
        start(&mut w, "p:bgPr", &[])?;
        solid_fill(&mut w, palette.background)?;
        empty(&mut w, "a:effectLst", &[])?;
        end(&mut w, "p:bgPr")?;
        end(&mut w, "p:bg")?;

        start(&mut w, "p:spTree", &[])?;
        group_properties(&mut w)?;

        Ok(Self {
            w,
            next_id: 2,
            palette,
        })
    }

    fn take_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    /// Add a borderless text box.
    pub(crate) fn text_box(
        &mut self,
        name: &str,
        frame: Rect,
        anchor: Anchor,
        paragraphs: &[Paragraph<'_>],
    ) -> XmlResult<()> {
        let id = self.take_id();
        let font = self.palette.font;
        let w = &mut self.w;

        start(w, "p:sp", &[])?;
        start(w, "p:nvSpPr", &[])?;
        empty(w, "p:cNvPr", &[("id", id.as_str()), ("name", name)])?;
        empty(w, "p:cNvSpPr", &[("txBox", "1")])?;
        empty(w, "p:nvPr", &[])?;
        end(w, "p:nvSpPr")?;

        start(w, "p:spPr", &[])?;
        xfrm(w, frame)?;
        preset_rect(w)?;
        empty(w, "a:noFill", &[])?;
        end(w, "p:spPr")?;

        start(w, "p:txBody", &[])?;
        start(
            w,
            "a:bodyPr",
            &[("wrap", "square"), ("rtlCol", "0"), ("anchor", anchor.attr())],
        )?;
        empty(w, "a:normAutofit", &[])?;
        end(w, "a:bodyPr")?;
        empty(w, "a:lstStyle", &[])?;
        for paragraph in paragraphs {
            write_paragraph(w, paragraph, font, self.palette.accent)?;
        }
        end(w, "p:txBody")?;
        end(w, "p:sp")
    }

    /// Add a filled rectangle in the accent color.
    pub(crate) fn accent_bar(&mut self, frame: Rect) -> XmlResult<()> {
        let id = self.take_id();
        let name = format!("Accent {}", id);
        let accent = self.palette.accent;
        let w = &mut self.w;

        start(w, "p:sp", &[])?;
        start(w, "p:nvSpPr", &[])?;
        empty(w, "p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
        empty(w, "p:cNvSpPr", &[])?;
        empty(w, "p:nvPr", &[])?;
        end(w, "p:nvSpPr")?;
        start(w, "p:spPr", &[])?;
        xfrm(w, frame)?;
        preset_rect(w)?;
        solid_fill(w, accent)?;
        start(w, "a:ln", &[])?;
        empty(w, "a:noFill", &[])?;
        end(w, "a:ln")?;
        end(w, "p:spPr")?;
        end(w, "p:sp")
    }

    /// Add a picture referencing an image relationship of this slide.
    pub(crate) fn picture(&mut self, rel_id: &str, frame: Rect) -> XmlResult<()> {
        let id = self.take_id();
        let name = format!("Picture {}", id);
        let w = &mut self.w;

        start(w, "p:pic", &[])?;
        start(w, "p:nvPicPr", &[])?;
        empty(w, "p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
        start(w, "p:cNvPicPr", &[])?;
        empty(w, "a:picLocks", &[("noChangeAspect", "1")])?;
        end(w, "p:cNvPicPr")?;
        empty(w, "p:nvPr", &[])?;
        end(w, "p:nvPicPr")?;

        start(w, "p:blipFill", &[])?;
        empty(w, "a:blip", &[("r:embed", rel_id)])?;
        start(w, "a:stretch", &[])?;
        empty(w, "a:fillRect", &[])?;
        end(w, "a:stretch")?;
        end(w, "p:blipFill")?;

        start(w, "p:spPr", &[])?;
        xfrm(w, frame)?;
        preset_rect(w)?;
        end(w, "p:spPr")?;
        end(w, "p:pic")
    }

    /// Close the slide and return the part bytes.
    pub(crate) fn finish(mut self) -> XmlResult<Vec<u8>> {
        let w = &mut self.w;
        end(w, "p:spTree")?;
        end(w, "p:cSld")?;
        start(w, "p:clrMapOvr", &[])?;
        empty(w, "a:masterClrMapping", &[])?;
        end(w, "p:clrMapOvr")?;
        end(w, "p:sld")?;
        Ok(self.w.into_inner())
    }
}

/// Build a notes part holding `notes` in the body placeholder.
pub(crate) fn notes_xml(notes: &str) -> XmlResult<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    write_decl(&mut w)?;
    start(
        &mut w,
        "p:notes",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    start(&mut w, "p:cSld", &[])?;
    start(&mut w, "p:spTree", &[])?;
    group_properties(&mut w)?;

    start(&mut w, "p:sp", &[])?;
    start(&mut w, "p:nvSpPr", &[])?;
    empty(&mut w, "p:cNvPr", &[("id", "2"), ("name", "Slide Image Placeholder 1")])?;
    start(&mut w, "p:cNvSpPr", &[])?;
    empty(
        &mut w,
        "a:spLocks",
        &[("noGrp", "1"), ("noRot", "1"), ("noChangeAspect", "1")],
    )?;
    end(&mut w, "p:cNvSpPr")?;
    start(&mut w, "p:nvPr", &[])?;
    empty(&mut w, "p:ph", &[("type", "sldImg")])?;
    end(&mut w, "p:nvPr")?;
    end(&mut w, "p:nvSpPr")?;
    empty(&mut w, "p:spPr", &[])?;
    end(&mut w, "p:sp")?;

    start(&mut w, "p:sp", &[])?;
    start(&mut w, "p:nvSpPr", &[])?;
    empty(&mut w, "p:cNvPr", &[("id", "3"), ("name", "Notes Placeholder 2")])?;
    start(&mut w, "p:cNvSpPr", &[])?;
    empty(&mut w, "a:spLocks", &[("noGrp", "1")])?;
    end(&mut w, "p:cNvSpPr")?;
    start(&mut w, "p:nvPr", &[])?;
    empty(&mut w, "p:ph", &[("type", "body"), ("idx", "1")])?;
    end(&mut w, "p:nvPr")?;
    end(&mut w, "p:nvSpPr")?;
    empty(&mut w, "p:spPr", &[])?;
    start(&mut w, "p:txBody", &[])?;
    empty(&mut w, "a:bodyPr", &[])?;
    empty(&mut w, "a:lstStyle", &[])?;
    // A text body needs at least one paragraph
    let lines: Vec<&str> = if notes.is_empty() { vec![""] } else { notes.lines().collect() };
    for line in lines {
        start(&mut w, "a:p", &[])?;
        if line.is_empty() {
            empty(&mut w, "a:endParaRPr", &[("lang", "en-US")])?;
        } else {
            start(&mut w, "a:r", &[])?;
            empty(&mut w, "a:rPr", &[("lang", "en-US"), ("dirty", "0")])?;
            text(&mut w, "a:t", line)?;
            end(&mut w, "a:r")?;
        }
        end(&mut w, "a:p")?;
    }
    end(&mut w, "p:txBody")?;
    end(&mut w, "p:sp")?;

    end(&mut w, "p:spTree")?;
    end(&mut w, "p:cSld")?;
    start(&mut w, "p:clrMapOvr", &[])?;
    empty(&mut w, "a:masterClrMapping", &[])?;
    end(&mut w, "p:clrMapOvr")?;
    end(&mut w, "p:notes")?;
    Ok(w.into_inner())
}

fn write_paragraph(
    w: &mut Writer<Vec<u8>>,
    paragraph: &Paragraph<'_>,
    font: &str,
    accent: &str,
) -> XmlResult<()> {
    start(w, "a:p", &[])?;

    match paragraph.bullet {
        Some(symbol) => {
            start(
                w,
                "a:pPr",
                &[
                    ("marL", "342900"),
                    ("indent", "-342900"),
                    ("algn", paragraph.align.attr()),
                ],
            )?;
            start(w, "a:spcBef", &[])?;
            empty(w, "a:spcPts", &[("val", "600")])?;
            end(w, "a:spcBef")?;
            start(w, "a:buClr", &[])?;
            empty(w, "a:srgbClr", &[("val", accent)])?;
            end(w, "a:buClr")?;
            empty(w, "a:buFont", &[("typeface", "Arial")])?;
            empty(w, "a:buChar", &[("char", symbol)])?;
            end(w, "a:pPr")?;
        }
        None => {
            start(w, "a:pPr", &[("algn", paragraph.align.attr())])?;
            empty(w, "a:buNone", &[])?;
            end(w, "a:pPr")?;
        }
    }

    let size = paragraph.size.to_string();
    let bold = if paragraph.bold { "1" } else { "0" };
    start(w, "a:r", &[])?;
    start(
        w,
        "a:rPr",
        &[("lang", "en-US"), ("sz", size.as_str()), ("b", bold), ("dirty", "0")],
    )?;
    solid_fill(w, paragraph.color)?;
    empty(w, "a:latin", &[("typeface", font)])?;
    end(w, "a:rPr")?;
    text(w, "a:t", paragraph.text)?;
    end(w, "a:r")?;

    end(w, "a:p")
}

fn write_decl(w: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
}

fn group_properties(w: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    start(w, "p:nvGrpSpPr", &[])?;
    empty(w, "p:cNvPr", &[("id", "1"), ("name", "")])?;
    empty(w, "p:cNvGrpSpPr", &[])?;
    empty(w, "p:nvPr", &[])?;
    end(w, "p:nvGrpSpPr")?;
    start(w, "p:grpSpPr", &[])?;
    start(w, "a:xfrm", &[])?;
    empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
    empty(w, "a:ext", &[("cx", "0"), ("cy", "0")])?;
    empty(w, "a:chOff", &[("x", "0"), ("y", "0")])?;
    empty(w, "a:chExt", &[("cx", "0"), ("cy", "0")])?;
    end(w, "a:xfrm")?;
    end(w, "p:grpSpPr")
}

fn xfrm(w: &mut Writer<Vec<u8>>, frame: Rect) -> XmlResult<()> {
    let (x, y) = (frame.x.to_string(), frame.y.to_string());
    let (cx, cy) = (frame.cx.to_string(), frame.cy.to_string());
    start(w, "a:xfrm", &[])?;
    empty(w, "a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    empty(w, "a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    end(w, "a:xfrm")
}

fn preset_rect(w: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    start(w, "a:prstGeom", &[("prst", "rect")])?;
    empty(w, "a:avLst", &[])?;
    end(w, "a:prstGeom")
}

fn solid_fill(w: &mut Writer<Vec<u8>>, color: &str) -> XmlResult<()> {
    start(w, "a:solidFill", &[])?;
    empty(w, "a:srgbClr", &[("val", color)])?;
    end(w, "a:solidFill")
}

fn start(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> XmlResult<()> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Start(el))
}

fn empty(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> XmlResult<()> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Empty(el))
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> XmlResult<()> {
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn text(w: &mut Writer<Vec<u8>>, name: &str, content: &str) -> XmlResult<()> {
    start(w, name, &[])?;
    w.write_event(Event::Text(BytesText::new(&xml_chars(content))))?;
    end(w, name)
}

/// Drop characters XML 1.0 cannot carry, even escaped.
pub(crate) fn xml_chars(text: &str) -> Cow<'_, str> {
    fn forbidden(c: char) -> bool {
        (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
    }

    if text.contains(forbidden) {
        Cow::Owned(text.chars().filter(|&c| !forbidden(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::Template;

    #[test]
    fn test_fit_wide_image() {
        let frame = Rect::new(0, 0, 1000, 1000);
        assert_eq!(frame.fit(Some((200, 100))), Rect::new(0, 250, 1000, 500));
    }

    #[test]
    fn test_fit_tall_image() {
        let frame = Rect::new(100, 0, 1000, 500);
        assert_eq!(frame.fit(Some((100, 100))), Rect::new(350, 0, 500, 500));
    }

    #[test]
    fn test_fit_unknown_size_uses_frame() {
        let frame = Rect::new(1, 2, 3, 4);
        assert_eq!(frame.fit(None), frame);
        assert_eq!(frame.fit(Some((0, 10))), frame);
    }

    #[test]
    fn test_text_is_escaped() {
        let mut slide = SlideXml::new(Palette::for_template(Template::Classic)).unwrap();
        slide
            .text_box(
                "Title",
                Rect::new(0, 0, 10, 10),
                Anchor::Top,
                &[Paragraph {
                    text: "R&D <2024>",
                    size: 3200,
                    bold: true,
                    color: "000000",
                    bullet: None,
                    align: Align::Left,
                }],
            )
            .unwrap();
        let xml = String::from_utf8(slide.finish().unwrap()).unwrap();

        assert!(xml.contains("R&amp;D &lt;2024&gt;"));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.ends_with("</p:sld>"));
    }

    #[test]
    fn test_xml_chars() {
        assert!(matches!(xml_chars("Tab\tand\nnewline"), Cow::Borrowed(_)));
        assert_eq!(xml_chars("Page\u{0C}break\u{0}"), "Pagebreak");
        assert_eq!(xml_chars("bell\u{7}\u{FFFF}"), "bell");
    }

    #[test]
    fn test_notes_drop_control_chars() {
        let xml = String::from_utf8(notes_xml("Next\u{0B}slide").unwrap()).unwrap();
        assert!(xml.contains("<a:t>Nextslide</a:t>"));
        assert!(!xml.contains('\u{0B}'));
    }

    #[test]
    fn test_shape_ids_increase() {
        let mut slide = SlideXml::new(Palette::for_template(Template::Dark)).unwrap();
        slide.accent_bar(Rect::new(0, 0, 1, 1)).unwrap();
        slide.picture("rId3", Rect::new(0, 0, 1, 1)).unwrap();
        let xml = String::from_utf8(slide.finish().unwrap()).unwrap();

        assert!(xml.contains(r#"<p:cNvPr id="2" name="Accent 2"/>"#));
        assert!(xml.contains(r#"<p:cNvPr id="3" name="Picture 3"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId3"/>"#));
        assert!(xml.contains(r#"<a:srgbClr val="111827"/>"#));
    }

    #[test]
    fn test_notes_lines_become_paragraphs() {
        let xml = String::from_utf8(notes_xml("First point.\n\nSecond point.").unwrap()).unwrap();
        assert_eq!(xml.matches("<a:p>").count(), 3);
        assert!(xml.contains("<a:t>Second point.</a:t>"));
        assert!(xml.contains(r#"<p:ph type="body" idx="1"/>"#));
    }
}
