use std::collections::HashMap;

use crate::model::NamedStyle;

use super::archive::Archive;
use super::{WML_NS, wml, wml_attr, wml_bool};

const MAX_BASED_ON_DEPTH: usize = 16;

#[derive(Default)]
struct ParagraphStyle {
    /// Lowercased `w:name`, e.g. "heading 1".
    name: String,
    based_on: Option<String>,
    outline_level: Option<u8>,
    num_id: Option<String>,
    num_level: Option<u8>,
}

#[derive(Clone, Copy, Default)]
pub(super) struct CharacterStyle {
    pub(super) bold: Option<bool>,
    pub(super) italic: Option<bool>,
}

pub(super) struct StyleNumbering<'s> {
    pub(super) num_id: &'s str,
    pub(super) level: Option<u8>,
}

#[derive(Default)]
pub(super) struct StylesInfo {
    paragraph_styles: HashMap<String, ParagraphStyle>,
    character_styles: HashMap<String, CharacterStyle>,
}

impl StylesInfo {
    pub(super) fn parse(archive: &mut Archive, part: &str) -> Self {
        let mut info = StylesInfo::default();
        let Some(xml_content) = archive.read_text(part) else {
            log::debug!("No {part}; style-based detection limited to style ids");
            return info;
        };
        let xml = match roxmltree::Document::parse(&xml_content) {
            Ok(xml) => xml,
            Err(e) => {
                log::warn!("Malformed {part}: {e}");
                return info;
            }
        };

        for style_node in xml.root_element().children() {
            if style_node.tag_name().name() != "style"
                || style_node.tag_name().namespace() != Some(WML_NS)
            {
                continue;
            }
            let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
                continue;
            };

            match style_node.attribute((WML_NS, "type")) {
                Some("paragraph") => {
                    let ppr = wml(style_node, "pPr");
                    let num_pr = ppr.and_then(|n| wml(n, "numPr"));
                    let style = ParagraphStyle {
                        name: wml_attr(style_node, "name")
                            .unwrap_or_default()
                            .to_lowercase(),
                        based_on: wml_attr(style_node, "basedOn").map(str::to_string),
                        outline_level: ppr
                            .and_then(|n| wml_attr(n, "outlineLvl"))
                            .and_then(|v| v.parse::<u8>().ok()),
                        num_id: num_pr
                            .and_then(|n| wml_attr(n, "numId"))
                            .map(str::to_string),
                        num_level: num_pr
                            .and_then(|n| wml_attr(n, "ilvl"))
                            .and_then(|v| v.parse::<u8>().ok()),
                    };
                    info.paragraph_styles.insert(style_id.to_string(), style);
                }
                Some("character") => {
                    let rpr = wml(style_node, "rPr");
                    info.character_styles.insert(
                        style_id.to_string(),
                        CharacterStyle {
                            bold: rpr.and_then(|n| wml_bool(n, "b")),
                            italic: rpr.and_then(|n| wml_bool(n, "i")),
                        },
                    );
                }
                _ => {}
            }
        }

        log::debug!(
            "{part}: {} paragraph styles, {} character styles",
            info.paragraph_styles.len(),
            info.character_styles.len()
        );
        info
    }

    /// The style followed by its `w:basedOn` ancestors, closest first.
    fn chain(&self, style_id: &str) -> impl Iterator<Item = &ParagraphStyle> {
        let mut next = self.paragraph_styles.get(style_id);
        std::iter::from_fn(move || {
            let current = next?;
            next = current
                .based_on
                .as_deref()
                .and_then(|id| self.paragraph_styles.get(id));
            Some(current)
        })
        .take(MAX_BASED_ON_DEPTH)
    }

    pub(super) fn heading_level(&self, style_id: &str) -> Option<u8> {
        if let Some(level) = heading_level_from_name(style_id) {
            return Some(level);
        }
        let style = self.paragraph_styles.get(style_id)?;
        if let Some(level) = heading_level_from_name(&style.name) {
            return Some(level);
        }
        self.chain(style_id)
            .find_map(|s| s.outline_level)
            .and_then(heading_level_from_outline)
    }

    pub(super) fn quote_style(&self, style_id: &str) -> Option<NamedStyle> {
        quote_style_from_name(style_id).or_else(|| {
            self.paragraph_styles
                .get(style_id)
                .and_then(|s| quote_style_from_name(&s.name))
        })
    }

    pub(super) fn numbering(&self, style_id: &str) -> Option<StyleNumbering<'_>> {
        let num_id = self.chain(style_id).find_map(|s| s.num_id.as_deref())?;
        let level = self.chain(style_id).find_map(|s| s.num_level);
        Some(StyleNumbering { num_id, level })
    }

    pub(super) fn character_style(&self, style_id: &str) -> CharacterStyle {
        self.character_styles
            .get(style_id)
            .copied()
            .unwrap_or_default()
    }
}

/// "Heading2", "heading 2" and "Title" name headings; levels past 6 clamp.
pub(super) fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.to_lowercase();
    if lower == "title" {
        return Some(1);
    }
    let digits = lower.strip_prefix("heading")?.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let level = digits.parse::<u32>().ok().filter(|l| *l >= 1)?;
    Some(level.min(6) as u8)
}

pub(super) fn heading_level_from_outline(outline_level: u8) -> Option<u8> {
    (outline_level <= 5).then_some(outline_level + 1)
}

fn quote_style_from_name(name: &str) -> Option<NamedStyle> {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    match compact.as_str() {
        "quote" => Some(NamedStyle::Quote),
        "intensequote" => Some(NamedStyle::IntenseQuote),
        _ => None,
    }
}
