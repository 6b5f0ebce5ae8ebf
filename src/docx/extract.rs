//! Plain-text and media extraction without building the full content model.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Error;
use crate::model::ImageFormat;

use super::archive::Archive;
use super::rels::Relationships;
use super::{WML_NS, find_image_ref, paragraph_text, parse_body, parse_xml, read_main_part};

/// An embedded image, listed once per relationship id in first-use order.
#[derive(Clone, Debug)]
pub struct ExtractedImage {
    pub rel_id: String,
    /// File name of the media entry inside the package, e.g. "image1.png".
    pub file_name: String,
    pub format: ImageFormat,
    pub data: Arc<[u8]>,
}

impl ExtractedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Extraction {
    /// Non-empty paragraph texts (table cells included) joined by `\n`.
    pub text: String,
    pub images: Vec<ExtractedImage>,
}

/// Destination for extracted images. Returns the public URL of the stored copy.
pub trait MediaStore {
    type Error: std::fmt::Display;

    fn store(&mut self, image: &ExtractedImage) -> Result<String, Self::Error>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub image_urls: Vec<String>,
}

pub(crate) fn extract_bytes(input: &[u8]) -> Result<Extraction, Error> {
    let mut archive = Archive::open(input)?;
    let main = read_main_part(&mut archive)?;
    let rels = Relationships::resolve(&mut archive, &main.path);
    let xml = parse_xml(&main.xml, &main.path)?;
    let body = parse_body(&xml, &main.path)?;

    let text = body
        .descendants()
        .filter(|n| n.tag_name().name() == "p" && n.tag_name().namespace() == Some(WML_NS))
        .map(paragraph_text)
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for node in body.descendants() {
        let Some(rel_id) = image_ref_of(node) else {
            continue;
        };
        if !seen.insert(rel_id) {
            continue;
        }
        let Some(media) = rels.media.get(rel_id) else {
            log::warn!("Image {rel_id} has no usable media; skipped");
            continue;
        };
        let file_name = media
            .path
            .rsplit_once('/')
            .map_or(media.path.as_str(), |(_, name)| name)
            .to_string();
        images.push(ExtractedImage {
            rel_id: rel_id.to_string(),
            file_name,
            format: media.format,
            data: Arc::clone(&media.data),
        });
    }

    log::debug!(
        "Extracted {} chars of text and {} images from {}",
        text.len(),
        images.len(),
        main.path
    );
    Ok(Extraction { text, images })
}

/// Only `w:drawing`/`w:pict` nodes count, so each picture is seen once.
fn image_ref_of<'a>(node: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    if node.tag_name().namespace() != Some(WML_NS) {
        return None;
    }
    match node.tag_name().name() {
        "drawing" | "pict" => find_image_ref(node),
        _ => None,
    }
}

pub(crate) fn extract_with_store<S: MediaStore>(
    input: &[u8],
    store: &mut S,
) -> Result<ExtractedText, Error> {
    let Extraction { text, images } = extract_bytes(input)?;
    let mut image_urls = Vec::with_capacity(images.len());
    for image in &images {
        match store.store(image) {
            Ok(url) => image_urls.push(url),
            Err(e) => log::warn!("Failed to store {} ({}): {e}", image.file_name, image.rel_id),
        }
    }
    Ok(ExtractedText { text, image_urls })
}
