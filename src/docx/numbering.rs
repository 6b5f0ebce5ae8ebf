use std::collections::HashMap;

use super::archive::Archive;
use super::{WML_NS, is_wml, wml, wml_attr};

/// Number formats per list definition, keyed by `w:ilvl`.
#[derive(Default)]
pub(super) struct NumberingInfo {
    abstract_formats: HashMap<String, HashMap<u8, String>>,
    num_to_abstract: HashMap<String, String>,
    overrides: HashMap<(String, u8), String>,
}

fn level_formats(parent: roxmltree::Node) -> impl Iterator<Item = (u8, String)> {
    parent.children().filter(|n| is_wml(*n, "lvl")).filter_map(|lvl| {
        let ilvl = lvl
            .attribute((WML_NS, "ilvl"))
            .and_then(|v| v.parse::<u8>().ok())?;
        let num_fmt = wml_attr(lvl, "numFmt").unwrap_or("bullet");
        Some((ilvl, num_fmt.to_string()))
    })
}

impl NumberingInfo {
    pub(super) fn parse(archive: &mut Archive, part: &str) -> Self {
        let mut info = NumberingInfo::default();
        let Some(xml_content) = archive.read_text(part) else {
            return info;
        };
        let xml = match roxmltree::Document::parse(&xml_content) {
            Ok(xml) => xml,
            Err(e) => {
                log::warn!("Malformed {part}: {e}");
                return info;
            }
        };

        for node in xml.root_element().children() {
            if node.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match node.tag_name().name() {
                "abstractNum" => {
                    let Some(abs_id) = node.attribute((WML_NS, "abstractNumId")) else {
                        continue;
                    };
                    info.abstract_formats
                        .insert(abs_id.to_string(), level_formats(node).collect());
                }
                "num" => {
                    let Some(num_id) = node.attribute((WML_NS, "numId")) else {
                        continue;
                    };
                    let Some(abs_id) = wml_attr(node, "abstractNumId") else {
                        continue;
                    };
                    info.num_to_abstract
                        .insert(num_id.to_string(), abs_id.to_string());
                    for over in node.children().filter(|n| is_wml(*n, "lvlOverride")) {
                        let Some(lvl) = wml(over, "lvl") else {
                            continue;
                        };
                        let Some(ilvl) = over
                            .attribute((WML_NS, "ilvl"))
                            .and_then(|v| v.parse::<u8>().ok())
                        else {
                            continue;
                        };
                        if let Some(num_fmt) = wml_attr(lvl, "numFmt") {
                            info.overrides
                                .insert((num_id.to_string(), ilvl), num_fmt.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        info
    }

    /// True when the level counts (decimal, letters, roman...) rather than bullets.
    /// Unknown definitions count as bulleted.
    pub(super) fn is_ordered(&self, num_id: &str, level: u8) -> bool {
        let num_fmt = self
            .overrides
            .get(&(num_id.to_string(), level))
            .or_else(|| {
                self.num_to_abstract
                    .get(num_id)
                    .and_then(|abs| self.abstract_formats.get(abs))
                    .and_then(|levels| levels.get(&level))
            });
        num_fmt.is_some_and(|f| f != "bullet" && f != "none")
    }
}
