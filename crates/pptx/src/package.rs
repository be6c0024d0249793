//! Package-level parts: content types, relationships, presentation and
//! document properties.

use crate::xml::xml_chars;
use quick_xml::escape::escape;
use std::collections::BTreeSet;

pub(crate) const ROOT_RELS: &str = include_str!("../templates/root.rels");
pub(crate) const SLIDE_MASTER: &str = include_str!("../templates/slideMaster.xml");
pub(crate) const SLIDE_MASTER_RELS: &str = include_str!("../templates/slideMaster.xml.rels");
pub(crate) const SLIDE_LAYOUT: &str = include_str!("../templates/slideLayout.xml");
pub(crate) const SLIDE_LAYOUT_RELS: &str = include_str!("../templates/slideLayout.xml.rels");
pub(crate) const NOTES_MASTER: &str = include_str!("../templates/notesMaster.xml");
pub(crate) const NOTES_MASTER_RELS: &str = include_str!("../templates/notesMaster.xml.rels");
pub(crate) const THEME: &str = include_str!("../templates/theme.xml");

/// 16:9 slide size in EMUs.
pub(crate) const SLIDE_WIDTH: i64 = 12_192_000;
pub(crate) const SLIDE_HEIGHT: i64 = 6_858_000;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument.presentationml";

/// Relationship id of the first slide in `presentation.xml.rels`.
pub(crate) const FIRST_SLIDE_REL: usize = 4;

/// A relationship entry of a `.rels` part.
pub(crate) struct Relationship {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
}

impl Relationship {
    pub(crate) fn new(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            target: target.into(),
        }
    }
}

/// Render a `.rels` part.
pub(crate) fn relationships(rels: &[Relationship]) -> String {
    let mut out = format!("{}\n<Relationships xmlns=\"{}\">", XML_DECL, RELS_NS);
    for rel in rels {
        out.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}/{}\" Target=\"{}\"/>",
            rel.id,
            REL_BASE,
            rel.kind,
            escape(&rel.target)
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// Render `[Content_Types].xml`.
///
/// `notes` lists the slide numbers that have a notes part.
pub(crate) fn content_types(
    slide_count: usize,
    notes: &[usize],
    media_extensions: &BTreeSet<&str>,
) -> String {
    let mut out = format!(
        "{}\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
        XML_DECL
    );
    for ext in media_extensions {
        out.push_str(&format!(
            "<Default Extension=\"{}\" ContentType=\"image/{}\"/>",
            ext, ext
        ));
    }

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), format!("{}.presentation.main+xml", CT_BASE)),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), format!("{}.slideMaster+xml", CT_BASE)),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), format!("{}.slideLayout+xml", CT_BASE)),
        ("/ppt/notesMasters/notesMaster1.xml".to_string(), format!("{}.notesMaster+xml", CT_BASE)),
        ("/ppt/theme/theme1.xml".to_string(), "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
        ("/ppt/theme/theme2.xml".to_string(), "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
        ("/docProps/core.xml".to_string(), "application/vnd.openxmlformats-package.core-properties+xml".to_string()),
        ("/docProps/app.xml".to_string(), "application/vnd.openxmlformats-officedocument.extended-properties+xml".to_string()),
    ];
    for n in 1..=slide_count {
        overrides.push((format!("/ppt/slides/slide{}.xml", n), format!("{}.slide+xml", CT_BASE)));
    }
    for n in notes {
        overrides.push((
            format!("/ppt/notesSlides/notesSlide{}.xml", n),
            format!("{}.notesSlide+xml", CT_BASE),
        ));
    }

    for (part, content_type) in overrides {
        out.push_str(&format!(
            "<Override PartName=\"{}\" ContentType=\"{}\"/>",
            part, content_type
        ));
    }
    out.push_str("</Types>");
    out
}

/// Render `ppt/presentation.xml` listing `slide_count` slides.
pub(crate) fn presentation(slide_count: usize) -> String {
    let mut slide_ids = String::new();
    for n in 0..slide_count {
        slide_ids.push_str(&format!(
            "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
            256 + n,
            FIRST_SLIDE_REL + n
        ));
    }

    format!(
        "{}\n<p:presentation xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
         xmlns:r=\"{}\" xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         saveSubsetFonts=\"1\">\
         <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
         <p:notesMasterIdLst><p:notesMasterId r:id=\"rId2\"/></p:notesMasterIdLst>\
         <p:sldIdLst>{}</p:sldIdLst>\
         <p:sldSz cx=\"{}\" cy=\"{}\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
         <p:defaultTextStyle><a:lvl1pPr><a:defRPr lang=\"en-US\"/></a:lvl1pPr></p:defaultTextStyle>\
         </p:presentation>",
        XML_DECL, REL_BASE, slide_ids, SLIDE_WIDTH, SLIDE_HEIGHT
    )
}

/// Render `ppt/_rels/presentation.xml.rels`.
pub(crate) fn presentation_rels(slide_count: usize) -> String {
    let mut rels = vec![
        Relationship::new("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        Relationship::new("rId2", "notesMaster", "notesMasters/notesMaster1.xml"),
        Relationship::new("rId3", "theme", "theme/theme1.xml"),
    ];
    for n in 0..slide_count {
        rels.push(Relationship::new(
            format!("rId{}", FIRST_SLIDE_REL + n),
            "slide",
            format!("slides/slide{}.xml", n + 1),
        ));
    }
    relationships(&rels)
}

/// Render `docProps/core.xml`.
pub(crate) fn core_properties(title: &str) -> String {
    format!(
        "{}\n<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:dcmitype=\"http://purl.org/dc/dcmitype/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>{}</dc:title><dc:creator>deckgen</dc:creator></cp:coreProperties>",
        XML_DECL,
        escape(&xml_chars(title))
    )
}

/// Render `docProps/app.xml`.
pub(crate) fn app_properties(slide_count: usize, notes_count: usize) -> String {
    format!(
        "{}\n<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" \
         xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">\
         <Application>deckgen</Application><PresentationFormat>Widescreen</PresentationFormat>\
         <Slides>{}</Slides><Notes>{}</Notes></Properties>",
        XML_DECL, slide_count, notes_count
    )
}
