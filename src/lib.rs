mod docx;
mod error;
mod model;
mod writer;

pub use docx::extract::{ExtractedImage, ExtractedText, Extraction, MediaStore};
pub use error::{Error, PackagingError};
pub use model::{
    Block, Document, FieldCode, Heading, Image, ImageFormat, ListItem, NamedStyle, Paragraph,
    ParseWarnings, Run, Table, TableCell, TableRow, TitleBlockFields,
};

use std::path::Path;
use std::time::Instant;

/// Output of a stamping run.
#[derive(Clone, Debug)]
pub struct StampedDocument {
    pub bytes: Vec<u8>,
    /// Suggested name derived from the document code.
    pub file_name: String,
    pub warnings: ParseWarnings,
}

/// Parse a DOCX package into the content model.
pub fn parse_docx_bytes(input: &[u8]) -> Result<Document, Error> {
    docx::parse_bytes(input)
}

/// Build a fresh DOCX package from `doc`, with the title block in the footer.
pub fn build_docx(doc: &Document, fields: &TitleBlockFields) -> Result<Vec<u8>, Error> {
    writer::render(doc, fields).map_err(|source| Error::PackagingFailed {
        document_code: fields.document_code.clone(),
        source,
    })
}

pub fn stamp_docx_bytes(input: &[u8], fields: &TitleBlockFields) -> Result<StampedDocument, Error> {
    let t0 = Instant::now();

    let doc = docx::parse_bytes(input)?;
    let t_parse = t0.elapsed();

    let bytes = build_docx(&doc, fields)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, build={:.1}ms, total={:.1}ms (output {} bytes, {} warnings)",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
        doc.warnings.total(),
    );

    Ok(StampedDocument {
        bytes,
        file_name: suggested_file_name(&fields.document_code),
        warnings: doc.warnings,
    })
}

pub fn stamp_docx(
    input: &Path,
    output: &Path,
    fields: &TitleBlockFields,
) -> Result<StampedDocument, Error> {
    let t0 = Instant::now();

    let file = std::fs::File::open(input).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, input.display())),
        ),
        _ => Error::Io(e),
    })?;
    let data = unsafe { memmap2::Mmap::map(&file) }?;

    let stamped = stamp_docx_bytes(&data, fields)?;
    let t_stamp = t0.elapsed();

    std::fs::write(output, &stamped.bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: stamp={:.1}ms, write={:.1}ms, total={:.1}ms ({})",
        t_stamp.as_secs_f64() * 1000.0,
        (t_total - t_stamp).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        output.display(),
    );

    Ok(stamped)
}

/// Plain text of the body plus every embedded image, each listed once.
pub fn extract_docx_bytes(input: &[u8]) -> Result<Extraction, Error> {
    docx::extract::extract_bytes(input)
}

/// Like [`extract_docx_bytes`], handing each image to `store` and keeping the
/// URLs it returns. An image the store rejects is logged and skipped.
pub fn extract_docx_with_store<S: MediaStore>(
    input: &[u8],
    store: &mut S,
) -> Result<ExtractedText, Error> {
    docx::extract::extract_with_store(input, store)
}

/// File name for a stamped package: letters, digits, `-`, `_` and `.` survive,
/// anything else becomes `_`.
pub fn suggested_file_name(document_code: &str) -> String {
    let sanitized: String = document_code
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = sanitized.trim_matches(|c| c == '_' || c == '.');
    if stem.is_empty() {
        "document.docx".to_string()
    } else {
        format!("{stem}.docx")
    }
}
