use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input could not be opened as a ZIP package, or its main part is unreadable.
    #[error("corrupt DOCX package: {0}")]
    PackageCorrupt(String),

    /// The main document part (or its `w:body`) is absent.
    #[error("missing document body: {0}")]
    BodyMissing(String),

    #[error("failed to package document {document_code:?}: {source}")]
    PackagingFailed {
        document_code: String,
        #[source]
        source: PackagingError,
    },

    #[error("invalid title block fields: {0}")]
    InvalidFields(String),
}

/// Faults raised while serializing the output package.
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("write: {0}")]
    Io(#[from] io::Error),

    #[error("xml formatting: {0}")]
    Format(#[from] std::fmt::Error),
}
