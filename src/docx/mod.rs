mod archive;
pub(crate) mod extract;
mod numbering;
mod rels;
mod styles;

use std::io::Cursor;
use std::sync::Arc;

use crate::error::Error;
use crate::model::{
    Block, Document, EMU_PER_PIXEL, Heading, Image, ImageFormat, ListItem, NamedStyle, Paragraph,
    ParseWarnings, Run, Table, TableCell, TableRow,
};

use archive::{Archive, resolve_target};
use numbering::NumberingInfo;
use rels::Relationships;
use styles::StylesInfo;

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(super) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const VML_NS: &str = "urn:schemas-microsoft-com:vml";
const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

/// Largest side, in pixels, accepted for an image's natural size.
const MAX_IMAGE_PIXELS: u32 = 1 << 16;

/// Parse a WML boolean toggle element (e.g., w:b, w:i).
/// Present with no val, or any val other than "0"/"false"/"off", means true.
pub(super) fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false" && v != "off")
    })
}

pub(super) fn wml<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

pub(super) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

/// Flatten SDT and customXml wrappers into their effective block children.
fn collect_block_nodes<'a>(parent: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if is_wml(child, "sdt") {
            if let Some(content) = wml(child, "sdtContent") {
                nodes.extend(collect_block_nodes(content));
            }
        } else if is_wml(child, "customXml") {
            nodes.extend(collect_block_nodes(child));
        } else {
            nodes.push(child);
        }
    }
    nodes
}

/// Visible text of one `w:r`. Field instructions and deleted text never show up here.
pub(super) fn run_text(run: roxmltree::Node) -> String {
    let mut text = String::new();
    for child in run.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or_default()),
            "tab" => text.push('\t'),
            "cr" => text.push('\n'),
            "br" => match child.attribute((WML_NS, "type")) {
                None | Some("textWrapping") => text.push('\n'),
                Some(_) => {}
            },
            "noBreakHyphen" => text.push('\u{2011}'),
            _ => {}
        }
    }
    text
}

/// Text of a paragraph's own runs, excluding paragraphs nested in text boxes.
pub(super) fn paragraph_text(paragraph: roxmltree::Node) -> String {
    paragraph
        .descendants()
        .filter(|n| is_wml(*n, "r"))
        .filter(|r| {
            !r.ancestors().any(|a| is_wml(a, "del") || is_wml(a, "moveFrom"))
                && r.ancestors().find(|a| is_wml(*a, "p")) == Some(paragraph)
        })
        .map(run_text)
        .collect()
}

fn is_drawing_container(node: roxmltree::Node) -> bool {
    match node.tag_name().namespace() {
        Some(WML_NS) => matches!(node.tag_name().name(), "drawing" | "pict" | "object"),
        Some(MC_NS) => node.tag_name().name() == "AlternateContent",
        _ => false,
    }
}

/// Relationship id of the picture inside a `w:drawing` (DrawingML) or `w:pict` (VML).
pub(super) fn find_image_ref<'a>(container: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    container.descendants().find_map(|n| {
        match (n.tag_name().namespace(), n.tag_name().name()) {
            (Some(DML_NS), "blip") => n.attribute((REL_NS, "embed")),
            (Some(VML_NS), "imagedata") => n.attribute((REL_NS, "id")),
            _ => None,
        }
    })
}

fn intrinsic_dimensions(data: &[u8], format: ImageFormat) -> Option<(u32, u32)> {
    let format = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Tiff => image::ImageFormat::Tiff,
        ImageFormat::Emf | ImageFormat::Wmf | ImageFormat::Svg => return None,
    };
    image::ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .ok()
        .filter(|(w, h)| *w > 0 && *h > 0)
        .map(|(w, h)| within_pixel_ceiling(w, h))
}

/// Shrink both sides proportionally so neither exceeds `MAX_IMAGE_PIXELS`.
fn within_pixel_ceiling(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_IMAGE_PIXELS {
        return (width, height);
    }
    let scale = |side: u32| {
        let scaled = u64::from(side) * u64::from(MAX_IMAGE_PIXELS) / u64::from(longest);
        u32::try_from(scaled).unwrap_or(MAX_IMAGE_PIXELS).max(1)
    };
    (scale(width), scale(height))
}

/// Display size from `wp:extent`, converted back to 96 DPI pixels.
fn extent_pixels(container: roxmltree::Node) -> Option<(u32, u32)> {
    let extent = container
        .descendants()
        .find(|n| n.tag_name().name() == "extent" && n.tag_name().namespace() == Some(WPD_NS))?;
    let cx = extent.attribute("cx")?.parse::<u64>().ok()?;
    let cy = extent.attribute("cy")?.parse::<u64>().ok()?;
    let width = u32::try_from(cx / EMU_PER_PIXEL).unwrap_or(u32::MAX);
    let height = u32::try_from(cy / EMU_PER_PIXEL).unwrap_or(u32::MAX);
    (width > 0 && height > 0).then(|| within_pixel_ceiling(width, height))
}

/// The main part's XML text and its location in the package.
pub(super) struct MainPart {
    pub(super) path: String,
    pub(super) xml: String,
}

pub(super) fn read_main_part(archive: &mut Archive) -> Result<MainPart, Error> {
    let path = archive.main_part();
    if !archive.contains(&path) {
        return Err(Error::BodyMissing(format!(
            "missing {path} (is this a DOCX file?)"
        )));
    }
    let xml = archive
        .read_text(&path)
        .ok_or_else(|| Error::PackageCorrupt(format!("{path} is unreadable")))?;
    Ok(MainPart { path, xml })
}

pub(super) fn parse_body<'x>(
    xml: &'x roxmltree::Document<'x>,
    path: &str,
) -> Result<roxmltree::Node<'x, 'x>, Error> {
    wml(xml.root_element(), "body")
        .ok_or_else(|| Error::BodyMissing(format!("{path} has no w:body")))
}

pub(super) fn parse_xml<'x>(text: &'x str, path: &str) -> Result<roxmltree::Document<'x>, Error> {
    roxmltree::Document::parse(text).map_err(|e| Error::PackageCorrupt(format!("{path}: {e}")))
}

pub(crate) fn parse_bytes(input: &[u8]) -> Result<Document, Error> {
    let mut archive = Archive::open(input)?;
    let main = read_main_part(&mut archive)?;

    let rels = Relationships::resolve(&mut archive, &main.path);
    let styles = StylesInfo::parse(&mut archive, &resolve_target(&main.path, "styles.xml"));
    let numbering =
        NumberingInfo::parse(&mut archive, &resolve_target(&main.path, "numbering.xml"));

    let xml = parse_xml(&main.xml, &main.path)?;
    let body = parse_body(&xml, &main.path)?;

    let mut parser = BodyParser {
        rels: &rels,
        styles: &styles,
        numbering: &numbering,
        warnings: ParseWarnings {
            dropped_media: rels.dropped_media,
            ..ParseWarnings::default()
        },
    };
    let blocks = parser.parse_blocks(body);

    log::debug!(
        "{}: {} top-level blocks, {} warnings",
        main.path,
        blocks.len(),
        parser.warnings.total()
    );

    Ok(Document {
        blocks,
        warnings: parser.warnings,
    })
}

enum ParagraphKind {
    Heading(u8),
    ListItem { level: u8, ordered: bool },
    Body(Option<NamedStyle>),
}

#[derive(Default)]
struct ParsedRuns {
    runs: Vec<Run>,
    images: Vec<Image>,
}

struct BodyParser<'a> {
    rels: &'a Relationships,
    styles: &'a StylesInfo,
    numbering: &'a NumberingInfo,
    warnings: ParseWarnings,
}

impl<'a> BodyParser<'a> {
    fn parse_blocks(&mut self, parent: roxmltree::Node) -> Vec<Block> {
        let mut blocks = Vec::new();
        for node in collect_block_nodes(parent) {
            if node.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match node.tag_name().name() {
                "p" => self.parse_paragraph(node, &mut blocks),
                "tbl" => {
                    if let Some(table) = self.parse_table(node) {
                        blocks.push(Block::Table(table));
                    }
                }
                other => log::trace!("Skipping w:{other}"),
            }
        }
        blocks
    }

    fn parse_paragraph(&mut self, node: roxmltree::Node, out: &mut Vec<Block>) {
        let ppr = wml(node, "pPr");
        let style_id = ppr.and_then(|p| wml_attr(p, "pStyle"));
        let ParsedRuns { runs, images } = self.parse_runs(node);

        if runs.iter().any(|r| !r.text.trim().is_empty()) {
            out.push(match self.classify(ppr, style_id) {
                ParagraphKind::Heading(level) => Block::Heading(Heading { runs, level }),
                ParagraphKind::ListItem { level, ordered } => Block::ListItem(ListItem {
                    runs,
                    level,
                    ordered,
                }),
                ParagraphKind::Body(style) => Block::Paragraph(Paragraph { runs, style }),
            });
        }
        out.extend(images.into_iter().map(Block::Image));
    }

    fn classify(&self, ppr: Option<roxmltree::Node>, style_id: Option<&str>) -> ParagraphKind {
        let heading = style_id
            .and_then(|id| self.styles.heading_level(id))
            .or_else(|| {
                ppr.and_then(|p| wml_attr(p, "outlineLvl"))
                    .and_then(|v| v.parse::<u8>().ok())
                    .and_then(styles::heading_level_from_outline)
            });
        if let Some(level) = heading {
            return ParagraphKind::Heading(level.clamp(1, 6));
        }

        // Direct numPr wins over the style's; numId 0 switches numbering off.
        let direct = ppr.and_then(|p| wml(p, "numPr"));
        let direct_level = direct
            .and_then(|np| wml_attr(np, "ilvl"))
            .and_then(|v| v.parse::<u8>().ok());
        let from_style = style_id.and_then(|id| self.styles.numbering(id));
        let num_id = direct
            .and_then(|np| wml_attr(np, "numId"))
            .or(from_style.as_ref().map(|n| n.num_id));
        if let Some(num_id) = num_id.filter(|id| *id != "0") {
            let level = direct_level
                .or(from_style.and_then(|n| n.level))
                .unwrap_or(0);
            return ParagraphKind::ListItem {
                level,
                ordered: self.numbering.is_ordered(num_id, level),
            };
        }

        ParagraphKind::Body(style_id.and_then(|id| self.styles.quote_style(id)))
    }

    fn parse_runs(&mut self, paragraph: roxmltree::Node) -> ParsedRuns {
        let mut parsed = ParsedRuns::default();
        self.collect_runs(paragraph, None, &mut parsed);
        parsed
    }

    fn collect_runs(
        &mut self,
        parent: roxmltree::Node,
        url: Option<&'a str>,
        out: &mut ParsedRuns,
    ) {
        for child in parent.children() {
            if child.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match child.tag_name().name() {
                "r" => self.parse_run(child, url, out),
                "hyperlink" => {
                    let target = self.hyperlink_target(child);
                    self.collect_runs(child, target, out);
                }
                "ins" | "smartTag" | "fldSimple" | "customXml" | "moveTo" | "dir" | "bdo" => {
                    self.collect_runs(child, url, out)
                }
                "sdt" => {
                    if let Some(content) = wml(child, "sdtContent") {
                        self.collect_runs(content, url, out);
                    }
                }
                _ => {}
            }
        }
    }

    /// `None` for internal anchors and for ids missing from the manifest.
    fn hyperlink_target(&mut self, node: roxmltree::Node) -> Option<&'a str> {
        let rels = self.rels;
        let id = node.attribute((REL_NS, "id"))?;
        match rels.hyperlinks.get(id) {
            Some(url) => Some(url.as_str()),
            None => {
                log::warn!("Hyperlink {id} has no target in the manifest; kept as plain text");
                self.warnings.unresolved_relationships += 1;
                None
            }
        }
    }

    fn parse_run(&mut self, run: roxmltree::Node, url: Option<&str>, out: &mut ParsedRuns) {
        let text = run_text(run);
        if !text.is_empty() {
            out.runs.push(match url {
                Some(url) => Run::hyperlink(text, url),
                None => {
                    let (bold, italic) = self.run_format(run);
                    Run::styled(text, bold, italic)
                }
            });
        }
        for child in run.children().filter(|n| is_drawing_container(*n)) {
            if let Some(image) = self.parse_image(child) {
                out.images.push(image);
            }
        }
    }

    fn run_format(&self, run: roxmltree::Node) -> (bool, bool) {
        let rpr = wml(run, "rPr");
        let char_style = rpr
            .and_then(|n| wml_attr(n, "rStyle"))
            .map(|id| self.styles.character_style(id))
            .unwrap_or_default();
        let bold = rpr
            .and_then(|n| wml_bool(n, "b"))
            .or(char_style.bold)
            .unwrap_or(false);
        let italic = rpr
            .and_then(|n| wml_bool(n, "i"))
            .or(char_style.italic)
            .unwrap_or(false);
        (bold, italic)
    }

    fn parse_image(&mut self, container: roxmltree::Node) -> Option<Image> {
        let id = find_image_ref(container)?;
        let Some(media) = self.rels.media.get(id) else {
            log::warn!("Image {id} has no usable media; dropped");
            self.warnings.unresolved_relationships += 1;
            return None;
        };
        let Some((pixel_width, pixel_height)) =
            intrinsic_dimensions(&media.data, media.format).or_else(|| extent_pixels(container))
        else {
            log::warn!("Image {id} ({}) has no measurable size; dropped", media.path);
            self.warnings.dropped_media += 1;
            return None;
        };
        Some(Image {
            data: Arc::clone(&media.data),
            format: media.format,
            pixel_width,
            pixel_height,
        })
    }

    fn parse_table(&mut self, node: roxmltree::Node) -> Option<Table> {
        let mut rows = Vec::new();
        for tr in collect_block_nodes(node) {
            if !is_wml(tr, "tr") {
                continue;
            }
            let mut cells = Vec::new();
            for tc in collect_block_nodes(tr) {
                if is_wml(tc, "tc") {
                    cells.push(TableCell {
                        blocks: self.parse_blocks(tc),
                    });
                }
            }
            if cells.is_empty() {
                log::debug!("Dropping table row without cells");
                continue;
            }
            rows.push(TableRow { cells });
        }
        if rows.is_empty() {
            log::debug!("Dropping table without rows");
            return None;
        }
        Some(Table { rows })
    }
}
