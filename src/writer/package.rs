use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::PackagingError;

use super::DocumentParts;

/// Zip every part in a fixed order with timestamps pinned to the ZIP epoch,
/// so identical parts always give identical bytes.
pub(super) fn write_package(parts: &DocumentParts) -> Result<Vec<u8>, PackagingError> {
    let xml_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    let media_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts.xml_parts() {
        zip.start_file(name, xml_options)?;
        zip.write_all(content.as_bytes())?;
    }
    for media in &parts.media {
        zip.start_file(media.name.as_str(), media_options)?;
        zip.write_all(&media.data)?;
    }

    let bytes = zip.finish()?.into_inner();
    log::debug!(
        "Packaged {} XML parts and {} media parts into {} bytes",
        parts.xml_parts().len(),
        parts.media.len(),
        bytes.len()
    );
    Ok(bytes)
}
