//! Share hook: hand a finished document to the user.
//!
//! The generator never shares anything itself. Callers pass the result to a
//! [`ShareTarget`] once they have it; embedders supply their own target for
//! platform share sheets, mail composers, and the like.

use crate::error::PdfError;
use crate::output::GeneratedPdf;
use tracing::{debug, info};

/// "Present this file to the user."
pub trait ShareTarget: Send + Sync {
    /// Share the document at `uri` under a display `title`.
    fn share(&self, uri: &str, title: &str) -> Result<(), PdfError>;
}

/// Does nothing. The default when no platform hook is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopShare;

impl ShareTarget for NoopShare {
    fn share(&self, uri: &str, title: &str) -> Result<(), PdfError> {
        debug!("Share requested for {uri} ({title}); no share target configured");
        Ok(())
    }
}

/// Opens the document in the desktop's default PDF viewer.
#[cfg(feature = "system-viewer")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemViewer;

#[cfg(feature = "system-viewer")]
impl ShareTarget for SystemViewer {
    fn share(&self, uri: &str, title: &str) -> Result<(), PdfError> {
        if !uri.starts_with("file://") {
            return Err(PdfError::InvalidConfig(format!(
                "system viewer can only open files, got '{uri}'"
            )));
        }
        info!("Opening {title} in the system viewer");
        open::that(uri).map_err(|e| PdfError::io(uri.trim_start_matches("file://"), e))
    }
}

/// Share a generated document, titled by `title` or its file name.
pub fn share_pdf(
    target: &dyn ShareTarget,
    pdf: &GeneratedPdf,
    title: Option<&str>,
) -> Result<(), PdfError> {
    let fallback = pdf
        .path()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    target.share(pdf.uri(), title.unwrap_or(&fallback))
}
