//! Document backends: one [`PdfBackend`] variant per output target.
//!
//! Every target (desktop file system, in-memory for wasm or servers) needs
//! the same three operations with different persistence semantics:
//!
//! ```text
//! begin(page_size) ──▶ add_page(image, placement)* ──▶ finish() → GeneratedPdf
//! ```
//!
//! Pages are appended in call order; nothing is reordered or deduplicated.
//! The variant is picked from [`crate::config::OutputTarget`] by
//! [`for_target`], never by inspecting a backend at runtime.
//!
//! ## No half-written files
//!
//! [`FileBackend`] opens a hidden temp file next to the destination in
//! `begin` and only renames it onto the destination once `finish` has
//! written and synced every byte. If the backend is dropped first (an error
//! in a later page, or the generating task being cancelled) the temp file is
//! deleted by `tempfile`'s drop guard and the destination is never touched.

use crate::config::{OutputTarget, PageSize};
use crate::error::PdfError;
use crate::output::{file_uri, GeneratedPdf, PdfLocation};
use crate::pipeline::composite::Placement;
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::write::{DocumentInfo, DocumentWriter};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A document sink.
pub trait PdfBackend: Send {
    /// Open a new document whose pages are all `page_size`.
    fn begin(&mut self, page_size: PageSize) -> Result<(), PdfError>;

    /// Append one page showing `image` under `placement`.
    fn add_page(&mut self, image: EncodedImage, placement: Placement) -> Result<(), PdfError>;

    /// Serialise and persist the document.
    fn finish(self: Box<Self>) -> Result<GeneratedPdf, PdfError>;
}

/// Pick the backend variant for `target`.
///
/// `output_path` is only used by the file variant.
pub fn for_target(
    target: OutputTarget,
    output_path: PathBuf,
    info: DocumentInfo,
) -> Box<dyn PdfBackend> {
    match target {
        OutputTarget::File => Box::new(FileBackend::new(output_path, info)),
        OutputTarget::Memory => Box::new(MemoryBackend::new(info)),
    }
}

fn not_begun() -> PdfError {
    PdfError::Internal("add_page called before begin".into())
}

fn begun_twice() -> PdfError {
    PdfError::Internal("begin called twice on the same backend".into())
}

// ── File ────────────────────────────────────────────────────────────────────

struct OpenFile {
    writer: DocumentWriter,
    temp: NamedTempFile,
}

/// Writes the document to `<dir>/<file_name>` atomically.
pub struct FileBackend {
    path: PathBuf,
    info: DocumentInfo,
    open: Option<OpenFile>,
}

impl FileBackend {
    pub fn new(path: PathBuf, info: DocumentInfo) -> Self {
        Self {
            path,
            info,
            open: None,
        }
    }

    fn io_err(&self, source: std::io::Error) -> PdfError {
        PdfError::io(&self.path, source)
    }
}

impl PdfBackend for FileBackend {
    fn begin(&mut self, page_size: PageSize) -> Result<(), PdfError> {
        if self.open.is_some() {
            return Err(begun_twice());
        }
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;

        let temp = tempfile::Builder::new()
            .prefix(".page2pdf-")
            .suffix(".pdf.part")
            .tempfile_in(&dir)
            .map_err(|e| self.io_err(e))?;
        debug!("Opened {} for {}", temp.path().display(), self.path.display());

        self.open = Some(OpenFile {
            writer: DocumentWriter::new(page_size, self.info.clone()),
            temp,
        });
        Ok(())
    }

    fn add_page(&mut self, image: EncodedImage, placement: Placement) -> Result<(), PdfError> {
        let open = self.open.as_mut().ok_or_else(not_begun)?;
        open.writer
            .add_page(image, placement)
            .map_err(|e| PdfError::io(&self.path, std::io::Error::other(e.to_string())))
    }

    fn finish(self: Box<Self>) -> Result<GeneratedPdf, PdfError> {
        let FileBackend { path, open, .. } = *self;
        let OpenFile { writer, mut temp } = open.ok_or_else(not_begun)?;
        let page_count = writer.page_count();
        let io_err = |e: std::io::Error| PdfError::io(&path, e);

        {
            let mut out = BufWriter::with_capacity(128 * 1024, temp.as_file_mut());
            writer
                .write_to(&mut out)
                .map_err(|e| io_err(std::io::Error::other(e.to_string())))?;
            out.flush().map_err(io_err)?;
        }
        temp.as_file().sync_all().map_err(io_err)?;

        let file = temp.persist(&path).map_err(|e| io_err(e.error))?;
        let file_size = file.metadata().map_err(io_err)?.len();
        let path = absolute(&path);

        info!(
            "Wrote {} ({} pages, {} bytes)",
            path.display(),
            page_count,
            file_size
        );
        Ok(GeneratedPdf {
            location: PdfLocation::File {
                uri: file_uri(&path),
                path,
            },
            file_size,
            page_count,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// ── Memory ──────────────────────────────────────────────────────────────────

/// Keeps the serialised document in a byte buffer.
pub struct MemoryBackend {
    info: DocumentInfo,
    writer: Option<DocumentWriter>,
}

impl MemoryBackend {
    pub fn new(info: DocumentInfo) -> Self {
        Self { info, writer: None }
    }
}

impl PdfBackend for MemoryBackend {
    fn begin(&mut self, page_size: PageSize) -> Result<(), PdfError> {
        if self.writer.is_some() {
            return Err(begun_twice());
        }
        self.writer = Some(DocumentWriter::new(page_size, self.info.clone()));
        Ok(())
    }

    fn add_page(&mut self, image: EncodedImage, placement: Placement) -> Result<(), PdfError> {
        self.writer
            .as_mut()
            .ok_or_else(not_begun)?
            .add_page(image, placement)
            .map_err(|e| PdfError::Internal(format!("PDF assembly failed: {e}")))
    }

    fn finish(self: Box<Self>) -> Result<GeneratedPdf, PdfError> {
        let writer = self.writer.ok_or_else(not_begun)?;
        let page_count = writer.page_count();
        let mut bytes = Vec::new();
        writer
            .write_to(&mut bytes)
            .map_err(|e| PdfError::Internal(format!("PDF serialisation failed: {e}")))?;
        debug!("Serialised {} pages into {} bytes", page_count, bytes.len());
        Ok(GeneratedPdf {
            file_size: bytes.len() as u64,
            location: PdfLocation::Memory { bytes },
            page_count,
        })
    }
}
