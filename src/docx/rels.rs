use std::collections::HashMap;
use std::sync::Arc;

use crate::model::ImageFormat;

use super::archive::{Archive, rels_path, resolve_target};

const IMAGE_REL_SUFFIX: &str = "/image";
const HYPERLINK_REL_SUFFIX: &str = "/hyperlink";

pub(crate) struct Media {
    pub(crate) data: Arc<[u8]>,
    pub(crate) format: ImageFormat,
    /// Package path the bytes were read from.
    pub(crate) path: String,
}

/// Lookup tables built from a part's relationship manifest.
#[derive(Default)]
pub(crate) struct Relationships {
    pub(crate) media: HashMap<String, Media>,
    pub(crate) hyperlinks: HashMap<String, String>,
    pub(crate) dropped_media: usize,
}

impl Relationships {
    pub(crate) fn resolve(archive: &mut Archive, part: &str) -> Self {
        let mut rels = Relationships::default();
        let manifest = rels_path(part);
        let Some(xml_content) = archive.read_text(&manifest) else {
            log::warn!(
                "No relationship manifest at {manifest}; hyperlinks and images will be dropped"
            );
            return rels;
        };
        let xml = match roxmltree::Document::parse(&xml_content) {
            Ok(xml) => xml,
            Err(e) => {
                log::warn!("Malformed relationship manifest {manifest}: {e}");
                return rels;
            }
        };

        for node in xml.root_element().children() {
            if node.tag_name().name() != "Relationship" {
                continue;
            }
            let (Some(id), Some(rel_type), Some(target)) = (
                node.attribute("Id"),
                node.attribute("Type"),
                node.attribute("Target"),
            ) else {
                continue;
            };
            let external = node.attribute("TargetMode") == Some("External");

            if rel_type.ends_with(HYPERLINK_REL_SUFFIX) {
                rels.hyperlinks.insert(id.to_string(), target.to_string());
            } else if rel_type.ends_with(IMAGE_REL_SUFFIX) {
                if external {
                    log::warn!("Image {id} is linked outside the package ({target}); dropped");
                    rels.dropped_media += 1;
                    continue;
                }
                let path = resolve_target(part, target);
                let Some(data) = archive.read_bytes(&path) else {
                    log::warn!("Image {id} points at missing entry {path}; dropped");
                    rels.dropped_media += 1;
                    continue;
                };
                let Some(format) = detect_image_format(&data, &path) else {
                    log::warn!("Image {id} ({path}) has an unrecognized format; dropped");
                    rels.dropped_media += 1;
                    continue;
                };
                rels.media.insert(
                    id.to_string(),
                    Media {
                        data: data.into(),
                        format,
                        path,
                    },
                );
            }
        }

        log::debug!(
            "{manifest}: {} media, {} hyperlinks, {} dropped",
            rels.media.len(),
            rels.hyperlinks.len(),
            rels.dropped_media
        );
        rels
    }
}

/// Raster formats are sniffed from magic bytes; vector formats only by extension.
pub(crate) fn detect_image_format(data: &[u8], path: &str) -> Option<ImageFormat> {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => return Some(ImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => return Some(ImageFormat::Jpeg),
        Ok(image::ImageFormat::Gif) => return Some(ImageFormat::Gif),
        Ok(image::ImageFormat::Bmp) => return Some(ImageFormat::Bmp),
        Ok(image::ImageFormat::Tiff) => return Some(ImageFormat::Tiff),
        _ => {}
    }
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "emf" => Some(ImageFormat::Emf),
        "wmf" => Some(ImageFormat::Wmf),
        "svg" => Some(ImageFormat::Svg),
        _ => None,
    }
}
