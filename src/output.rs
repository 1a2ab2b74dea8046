//! Output types returned by the generator.

use crate::error::PdfError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one generation: exactly one per invocation, never partial.
pub type PdfResult = Result<GeneratedPdf, PdfError>;

/// Where the finished document lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PdfLocation {
    /// Persisted file.
    File {
        /// Absolute path of the document.
        path: PathBuf,
        /// `file://` URI of the same document, for share targets.
        uri: String,
    },
    /// Serialised document kept in memory.
    Memory {
        #[serde(skip_serializing)]
        bytes: Vec<u8>,
    },
}

/// A successfully generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPdf {
    pub location: PdfLocation,
    /// Size of the serialised document in bytes.
    pub file_size: u64,
    /// Pages in the document; always equals the number of registered pages.
    pub page_count: usize,
}

impl GeneratedPdf {
    /// URI suitable for a share target: `file://…` or `memory:`.
    pub fn uri(&self) -> &str {
        match &self.location {
            PdfLocation::File { uri, .. } => uri,
            PdfLocation::Memory { .. } => "memory:",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            PdfLocation::File { path, .. } => Some(path),
            PdfLocation::Memory { .. } => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.location {
            PdfLocation::File { .. } => None,
            PdfLocation::Memory { bytes } => Some(bytes),
        }
    }

    /// Take the in-memory document, if that is where it lives.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self.location {
            PdfLocation::File { .. } => None,
            PdfLocation::Memory { bytes } => Some(bytes),
        }
    }
}

/// Build a `file://` URI for an absolute path.
///
/// Each path segment is percent-encoded as UTF-8. A leading drive segment
/// (`C:`) keeps its colon.
pub(crate) fn file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut uri = String::from("file://");
    if !raw.starts_with('/') {
        uri.push('/');
    }
    for (i, segment) in raw.split('/').enumerate() {
        if i > 0 {
            uri.push('/');
        }
        if i == 0 && is_drive(segment) {
            uri.push_str(segment);
        } else {
            uri.push_str(&urlencoding::encode(segment));
        }
    }
    uri
}

fn is_drive(segment: &str) -> bool {
    let b = segment.as_bytes();
    b.len() == 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}
