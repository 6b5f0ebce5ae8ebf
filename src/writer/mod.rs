mod package;
mod parts;
mod stamp;
mod table;

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::Arc;

use crate::error::PackagingError;
use crate::model::{Block, Document, EMU_PER_PIXEL, Image, ImageFormat, Run, TitleBlockFields};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";
const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// A4 portrait, twips. The right and bottom margins leave room for the title block.
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const MARGIN_LEFT: u32 = 1134;
const MARGIN_RIGHT: u32 = 283;
const MARGIN_TOP: u32 = 851;
const MARGIN_BOTTOM: u32 = 2835;
const HEADER_DISTANCE: u32 = 283;
const FOOTER_DISTANCE: u32 = 283;
const TEXT_WIDTH: u32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

const EMU_PER_TWIP: u64 = 635;

const LIST_STYLE: &str = "ListParagraph";
const HYPERLINK_STYLE: &str = "Hyperlink";
const BULLET_NUM_ID: u32 = 1;
const FIRST_ORDERED_NUM_ID: u32 = 2;
const MAX_LIST_LEVEL: u8 = 8;

const STYLES_PART: &str = "styles.xml";
const NUMBERING_PART: &str = "numbering.xml";
const FOOTER_PART: &str = "footer1.xml";
const FOOTER_REL_ID: &str = "rId3";

/// One entry of a relationship manifest.
pub(crate) struct Relationship {
    pub(crate) id: String,
    pub(crate) rel_type: String,
    pub(crate) target: String,
    pub(crate) external: bool,
}

impl Relationship {
    fn internal(id: impl Into<String>, kind: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: format!("{REL_TYPE_BASE}/{kind}"),
            target: target.into(),
            external: false,
        }
    }
}

pub(crate) struct MediaPart {
    /// Full entry name, e.g. "word/media/image1.png".
    pub(crate) name: String,
    pub(crate) data: Arc<[u8]>,
    pub(crate) format: ImageFormat,
}

/// Every part of the output package, serialized but not yet zipped.
pub(crate) struct DocumentParts {
    pub(crate) content_types: String,
    pub(crate) package_rels: String,
    pub(crate) core_properties: String,
    pub(crate) document: String,
    pub(crate) document_rels: String,
    pub(crate) styles: String,
    pub(crate) numbering: String,
    pub(crate) footer: String,
    pub(crate) media: Vec<MediaPart>,
}

impl DocumentParts {
    /// XML parts in package order.
    pub(crate) fn xml_parts(&self) -> [(&'static str, &str); 8] {
        [
            ("[Content_Types].xml", self.content_types.as_str()),
            ("_rels/.rels", self.package_rels.as_str()),
            ("docProps/core.xml", self.core_properties.as_str()),
            ("word/document.xml", self.document.as_str()),
            ("word/_rels/document.xml.rels", self.document_rels.as_str()),
            ("word/styles.xml", self.styles.as_str()),
            ("word/numbering.xml", self.numbering.as_str()),
            ("word/footer1.xml", self.footer.as_str()),
        ]
    }
}

pub(crate) fn render(doc: &Document, fields: &TitleBlockFields) -> Result<Vec<u8>, PackagingError> {
    let parts = build_parts(doc, fields)?;
    package::write_package(&parts)
}

pub(crate) fn build_parts(
    doc: &Document,
    fields: &TitleBlockFields,
) -> Result<DocumentParts, PackagingError> {
    let mut body = BodyWriter::new();
    body.write_document(&doc.blocks)?;
    let footer = stamp::footer_xml(fields)?;

    log::debug!(
        "Built body: {} bytes of XML, {} relationships, {} media parts, {} ordered lists",
        body.xml.len(),
        body.relationships.len(),
        body.media.len(),
        body.ordered_lists
    );

    Ok(DocumentParts {
        content_types: parts::content_types_xml(&body.media)?,
        package_rels: parts::package_relationships_xml()?,
        core_properties: parts::core_properties_xml(fields)?,
        document_rels: parts::relationships_xml(&body.relationships)?,
        styles: parts::styles_xml()?,
        numbering: parts::numbering_xml(body.ordered_lists)?,
        footer,
        document: body.xml,
        media: body.media,
    })
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Append `text` escaped for XML content or attributes. Characters XML 1.0
/// cannot carry are dropped.
fn push_escaped(xml: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            '\'' => xml.push_str("&apos;"),
            '\r' => xml.push_str("&#xD;"),
            c if is_xml_char(c) => xml.push(c),
            _ => {}
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    push_escaped(&mut escaped, text);
    escaped
}

/// Write one `w:r`, turning `\t` into `w:tab` and `\n` into `w:br`.
fn write_text_run(xml: &mut String, text: &str, run_props: &str) -> fmt::Result {
    xml.push_str("<w:r>");
    if !run_props.is_empty() {
        write!(xml, "<w:rPr>{run_props}</w:rPr>")?;
    }
    let mut rest = text;
    while let Some(pos) = rest.find(['\t', '\n']) {
        write_text(xml, &rest[..pos]);
        xml.push_str(if rest.as_bytes()[pos] == b'\t' {
            "<w:tab/>"
        } else {
            "<w:br/>"
        });
        rest = &rest[pos + 1..];
    }
    write_text(xml, rest);
    xml.push_str("</w:r>");
    Ok(())
}

fn write_text(xml: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    push_escaped(xml, text);
    xml.push_str("</w:t>");
}

/// Cells and bodies must close with a paragraph; so must anything left empty.
fn needs_trailing_paragraph(blocks: &[Block]) -> bool {
    matches!(blocks.last(), None | Some(Block::Table(_)))
}

/// Scale pixel dimensions (96 DPI) to EMU, shrinking to fit `max_width` twips.
fn image_extent(image: &Image, max_width: u32) -> (u64, u64) {
    let cx = u64::from(image.pixel_width.max(1)) * EMU_PER_PIXEL;
    let cy = u64::from(image.pixel_height.max(1)) * EMU_PER_PIXEL;
    let max_cx = u64::from(max_width.max(1)) * EMU_PER_TWIP;
    if cx > max_cx {
        let cy = u128::from(cy) * u128::from(max_cx) / u128::from(cx);
        (max_cx, u64::try_from(cy).unwrap_or(u64::MAX).max(1))
    } else {
        (cx, cy)
    }
}

struct BodyWriter {
    xml: String,
    relationships: Vec<Relationship>,
    hyperlink_ids: HashMap<String, String>,
    media: Vec<MediaPart>,
    ordered_lists: u32,
    open_ordered_list: Option<u32>,
}

impl BodyWriter {
    fn new() -> Self {
        Self {
            xml: String::with_capacity(64 * 1024),
            relationships: vec![
                Relationship::internal("rId1", "styles", STYLES_PART),
                Relationship::internal("rId2", "numbering", NUMBERING_PART),
                Relationship::internal(FOOTER_REL_ID, "footer", FOOTER_PART),
            ],
            hyperlink_ids: HashMap::new(),
            media: Vec::new(),
            ordered_lists: 0,
            open_ordered_list: None,
        }
    }

    fn push_relationship(&mut self, kind: &str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.relationships.len() + 1);
        self.relationships.push(Relationship {
            id: id.clone(),
            rel_type: format!("{REL_TYPE_BASE}/{kind}"),
            target,
            external,
        });
        id
    }

    /// One external relationship per distinct URL.
    fn hyperlink_rel(&mut self, url: &str) -> String {
        if let Some(id) = self.hyperlink_ids.get(url) {
            return id.clone();
        }
        let id = self.push_relationship("hyperlink", url.to_string(), true);
        self.hyperlink_ids.insert(url.to_string(), id.clone());
        id
    }

    /// Bullets share one numbering instance; each contiguous ordered list gets its own.
    fn list_num_id(&mut self, ordered: bool) -> u32 {
        if !ordered {
            return BULLET_NUM_ID;
        }
        if let Some(num_id) = self.open_ordered_list {
            return num_id;
        }
        let num_id = FIRST_ORDERED_NUM_ID + self.ordered_lists;
        self.ordered_lists += 1;
        self.open_ordered_list = Some(num_id);
        num_id
    }

    fn write_document(&mut self, blocks: &[Block]) -> fmt::Result {
        self.xml.push_str(XML_DECLARATION);
        write!(
            self.xml,
            r#"<w:document xmlns:w="{WML_NS}" xmlns:r="{REL_NS}" xmlns:wp="{WPD_NS}" xmlns:a="{DML_NS}" xmlns:pic="{PIC_NS}"><w:body>"#
        )?;
        self.write_blocks(blocks, TEXT_WIDTH)?;
        if needs_trailing_paragraph(blocks) {
            self.xml.push_str("<w:p/>");
        }
        write!(
            self.xml,
            r#"<w:sectPr><w:footerReference w:type="default" r:id="{FOOTER_REL_ID}"/><w:pgSz w:w="{PAGE_WIDTH}" w:h="{PAGE_HEIGHT}"/><w:pgMar w:top="{MARGIN_TOP}" w:right="{MARGIN_RIGHT}" w:bottom="{MARGIN_BOTTOM}" w:left="{MARGIN_LEFT}" w:header="{HEADER_DISTANCE}" w:footer="{FOOTER_DISTANCE}" w:gutter="0"/><w:cols w:space="708"/></w:sectPr>"#
        )?;
        self.xml.push_str("</w:body></w:document>");
        Ok(())
    }

    fn write_blocks(&mut self, blocks: &[Block], available_width: u32) -> fmt::Result {
        for block in blocks {
            match block {
                Block::Paragraph(p) => {
                    self.open_ordered_list = None;
                    self.write_paragraph(p.style.map(|s| s.style_id()), None, &p.runs)?;
                }
                Block::Heading(h) => {
                    self.open_ordered_list = None;
                    let style = format!("Heading{}", h.level.clamp(1, 6));
                    self.write_paragraph(Some(&style), None, &h.runs)?;
                }
                Block::ListItem(item) => {
                    let num_id = self.list_num_id(item.ordered);
                    let level = item.level.min(MAX_LIST_LEVEL);
                    self.write_paragraph(Some(LIST_STYLE), Some((num_id, level)), &item.runs)?;
                }
                Block::Table(t) => {
                    self.open_ordered_list = None;
                    self.write_table(t, available_width)?;
                    self.open_ordered_list = None;
                }
                Block::Image(image) => {
                    self.open_ordered_list = None;
                    self.write_image(image, available_width)?;
                }
            }
        }
        Ok(())
    }

    fn write_paragraph(
        &mut self,
        style: Option<&str>,
        numbering: Option<(u32, u8)>,
        runs: &[Run],
    ) -> fmt::Result {
        self.xml.push_str("<w:p>");
        if style.is_some() || numbering.is_some() {
            self.xml.push_str("<w:pPr>");
            if let Some(style) = style {
                write!(self.xml, r#"<w:pStyle w:val="{style}"/>"#)?;
            }
            if let Some((num_id, level)) = numbering {
                write!(
                    self.xml,
                    r#"<w:numPr><w:ilvl w:val="{level}"/><w:numId w:val="{num_id}"/></w:numPr>"#
                )?;
            }
            self.xml.push_str("</w:pPr>");
        }
        for run in runs {
            self.write_run(run)?;
        }
        self.xml.push_str("</w:p>");
        Ok(())
    }

    fn write_run(&mut self, run: &Run) -> fmt::Result {
        match &run.hyperlink_url {
            Some(url) => {
                let id = self.hyperlink_rel(url);
                write!(self.xml, r#"<w:hyperlink r:id="{id}" w:history="1">"#)?;
                let props = format!(r#"<w:rStyle w:val="{HYPERLINK_STYLE}"/>"#);
                write_text_run(&mut self.xml, &run.text, &props)?;
                self.xml.push_str("</w:hyperlink>");
                Ok(())
            }
            None => {
                let props = match (run.bold, run.italic) {
                    (true, true) => "<w:b/><w:i/>",
                    (true, false) => "<w:b/>",
                    (false, true) => "<w:i/>",
                    (false, false) => "",
                };
                write_text_run(&mut self.xml, &run.text, props)
            }
        }
    }

    fn write_image(&mut self, image: &Image, available_width: u32) -> fmt::Result {
        let index = self.media.len() + 1;
        let file_name = format!("image{index}.{}", image.format.extension());
        let id = self.push_relationship("image", format!("media/{file_name}"), false);
        self.media.push(MediaPart {
            name: format!("word/media/{file_name}"),
            data: Arc::clone(&image.data),
            format: image.format,
        });

        let (cx, cy) = image_extent(image, available_width);
        write!(
            self.xml,
            concat!(
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
                r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:docPr id="{index}" name="Picture {index}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="{pic_ns}"><pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="0" name="{file_name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            ),
            cx = cx,
            cy = cy,
            index = index,
            pic_ns = PIC_NS,
            file_name = file_name,
            id = id,
        )
    }
}
