//! Error types for the edgequake-page2pdf library.
//!
//! Two error types reflect the two sides of the render boundary:
//!
//! * [`PdfError`]: returned by the generator. Any failure at any stage
//!   aborts the whole invocation; there is no partial document. Each variant
//!   maps onto one [`ErrorKind`] so callers can branch on the category without
//!   matching every variant.
//!
//! * [`RenderError`]: returned by a page's render collaborator
//!   ([`crate::page::PageContent`]). The generator converts it into the
//!   matching [`PdfError`] together with the 1-indexed page number.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-page2pdf generator.
#[derive(Debug, Error)]
pub enum PdfError {
    // ── Host errors ───────────────────────────────────────────────────────
    /// The host handle was never initialised.
    #[error("PDF host not initialized. Call HostContext::init first.")]
    NotInitialized,

    /// The host context was invalidated or dropped while the handle was in use.
    #[error("Host context lost. Reinitialize the host context.")]
    ContextLost,

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The render collaborator could not produce a buffer for a page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderingFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Opening, writing, or persisting the output document failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document being read back could not be parsed.
    #[error("Corrupt PDF: {0}")]
    CorruptPdf(String),

    // ── Validation errors ─────────────────────────────────────────────────
    /// The page builder registered nothing.
    #[error("No pages defined")]
    NoPages,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (panicked worker, misuse of a backend).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error category, stable across variant additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotInitialized,
    ContextLost,
    RenderingFailed,
    #[serde(rename = "IOError")]
    IoError,
    Unknown,
}

impl PdfError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfError::NotInitialized => ErrorKind::NotInitialized,
            PdfError::ContextLost => ErrorKind::ContextLost,
            PdfError::RenderingFailed { .. } => ErrorKind::RenderingFailed,
            PdfError::Io { .. } => ErrorKind::IoError,
            PdfError::CorruptPdf(_)
            | PdfError::NoPages
            | PdfError::InvalidConfig(_)
            | PdfError::Internal(_) => ErrorKind::Unknown,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PdfError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a page number to a collaborator-side error.
    pub(crate) fn from_render(page: usize, err: RenderError) -> Self {
        match err {
            RenderError::SurfaceLost => PdfError::ContextLost,
            RenderError::Failed(detail) => PdfError::RenderingFailed { page, detail },
            RenderError::TimedOut { secs } => PdfError::RenderingFailed {
                page,
                detail: format!("render timed out after {secs}s"),
            },
        }
    }
}

/// Failure reported by a page's render collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The page could not be drawn.
    #[error("{0}")]
    Failed(String),

    /// The surface or window the collaborator draws into went away.
    #[error("render surface lost")]
    SurfaceLost,

    /// The collaborator did not settle within the configured timeout.
    #[error("render timed out after {secs}s")]
    TimedOut { secs: u64 },
}

impl RenderError {
    pub fn failed(detail: impl Into<String>) -> Self {
        RenderError::Failed(detail.into())
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Failed(e.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Failed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pages_is_unknown_kind() {
        let e = PdfError::NoPages;
        assert_eq!(e.kind(), ErrorKind::Unknown);
        assert_eq!(e.to_string(), "No pages defined");
    }

    #[test]
    fn io_error_display_includes_path() {
        let e = PdfError::io(
            "/nope/out.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(e.kind(), ErrorKind::IoError);
        let msg = e.to_string();
        assert!(msg.contains("/nope/out.pdf"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }

    #[test]
    fn render_error_maps_to_page_error() {
        let e = PdfError::from_render(3, RenderError::failed("boom"));
        assert_eq!(e.kind(), ErrorKind::RenderingFailed);
        assert!(e.to_string().contains("page 3"));
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn surface_lost_maps_to_context_lost() {
        let e = PdfError::from_render(1, RenderError::SurfaceLost);
        assert_eq!(e.kind(), ErrorKind::ContextLost);
    }

    #[test]
    fn timeout_display() {
        let e = PdfError::from_render(2, RenderError::TimedOut { secs: 5 });
        assert!(e.to_string().contains("5s"), "got: {e}");
    }

    #[test]
    fn io_kind_serialises_like_the_taxonomy() {
        let json = serde_json::to_string(&ErrorKind::IoError).unwrap();
        assert_eq!(json, "\"IOError\"");
    }
}
