//! Generation entry points: the page-by-page state machine.
//!
//! ```text
//! Idle ─▶ BuildingPages ─▶ ┌ Rendering ─▶ Compositing ─▶ Encoding ┐ ─▶ Done
//!              │           └──────────── next page ◀──────────────┘
//!              └─────────────── any failure ───────────────▶ Failed
//! ```
//!
//! Pages go through the pipeline strictly one at a time. The buffer of page
//! N is consumed by the encoder and freed before page N + 1 is rendered, so
//! peak pixel memory is one page regardless of document length.
//!
//! Any failure aborts the whole invocation and comes back as the `Err` side
//! of [`PdfResult`]. Nothing is retried and no partial document is kept.
//!
//! ## Cancellation
//!
//! Dropping the returned future cancels the generation. The backend is
//! dropped with it, which deletes the temp file of a
//! [`crate::backend::FileBackend`], so a cancelled run leaves no output
//! behind. Once the final write has been handed to the blocking pool it runs
//! to completion, and the file it produces is complete.

use crate::backend;
use crate::config::PdfConfig;
use crate::error::PdfError;
use crate::host::HostHandle;
use crate::output::PdfResult;
use crate::page::{DocumentSpec, PageScope};
use crate::pipeline::composite::{composite, CompositeOptions};
use crate::pipeline::encode::encode_image;
use crate::pipeline::render;
use crate::pipeline::write::DocumentInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// States of one generation, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStage {
    Idle,
    BuildingPages,
    Rendering,
    Compositing,
    Encoding,
    Done,
    Failed,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Generate a PDF from pages registered by `pages`.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use edgequake_page2pdf::{generate_pdf, HostConfig, HostContext, PdfConfig, RenderedPage};
/// use image::{Rgba, RgbaImage};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = HostContext::init(HostConfig::default())?;
/// let config = PdfConfig::builder().file_name("hello.pdf").build()?;
///
/// let pdf = generate_pdf(&host.handle(), &config, |p| {
///     p.page_fn(|target| {
///         let white = RgbaImage::from_pixel(target.width_px, target.height_px, Rgba([255; 4]));
///         Ok(RenderedPage::for_target(white, &target))
///     });
/// })
/// .await?;
///
/// println!("{} pages → {}", pdf.page_count, pdf.uri());
/// # Ok(())
/// # }
/// ```
pub async fn generate_pdf<F>(host: &HostHandle, config: &PdfConfig, pages: F) -> PdfResult
where
    F: FnOnce(&mut PageScope),
{
    let spec = DocumentSpec::build(config.clone(), pages);
    generate_document(host, &spec).await
}

/// Generate a PDF from a prepared [`DocumentSpec`].
pub async fn generate_document(host: &HostHandle, spec: &DocumentSpec) -> PdfResult {
    let start = Instant::now();
    let config = spec.config();
    info!(
        "Starting PDF generation: {} ({} pages, {})",
        config.file_name,
        spec.page_count(),
        config.page_size
    );

    let result = run(host, spec).await;

    match &result {
        Ok(pdf) => {
            transition(GenerationStage::Done);
            info!(
                "PDF generation successful: {} ({} pages, {} bytes, {}ms)",
                pdf.uri(),
                pdf.page_count,
                pdf.file_size,
                start.elapsed().as_millis()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_generation_complete(pdf.page_count, pdf.file_size);
            }
        }
        Err(e) => {
            transition(GenerationStage::Failed);
            error!("Failed to generate PDF: {e}");
            if let Some(ref cb) = config.progress_callback {
                cb.on_generation_failed(e);
            }
        }
    }

    result
}

/// Synchronous wrapper around [`generate_pdf`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn generate_pdf_sync<F>(host: &HostHandle, config: &PdfConfig, pages: F) -> PdfResult
where
    F: FnOnce(&mut PageScope),
{
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_pdf(host, config, pages))
}

fn transition(stage: GenerationStage) {
    debug!("Generation stage → {stage}");
}

async fn run(host: &HostHandle, spec: &DocumentSpec) -> PdfResult {
    let config = spec.config();
    transition(GenerationStage::Idle);

    // ── Step 1: Validate page list and config ────────────────────────────
    transition(GenerationStage::BuildingPages);
    if spec.page_count() == 0 {
        return Err(PdfError::NoPages);
    }
    config.validate()?;

    // ── Step 2: Resolve output location from the host ────────────────────
    let output_dir = {
        let state = host.acquire()?;
        config
            .output_directory
            .clone()
            .unwrap_or_else(|| state.output_directory().to_path_buf())
    };
    let output_path = output_dir.join(&config.file_name);

    let total = spec.page_count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total);
    }

    // ── Step 3: Open the document ────────────────────────────────────────
    let mut backend = backend::for_target(
        config.output_target,
        output_path,
        DocumentInfo {
            title: config.title.clone(),
            author: config.author.clone(),
            producer: config.producer.clone(),
        },
    );
    backend.begin(config.page_size)?;

    let target = spec.render_target();
    let timeout = config.render_timeout_secs.map(Duration::from_secs);
    let composite_opts = CompositeOptions {
        page_size: config.page_size,
        downsample_overflow: config.downsample_overflow,
    };
    let level = config.compression_level;

    // ── Step 4: Render → composite → encode, one page at a time ──────────
    for (idx, content) in spec.pages().iter().enumerate() {
        let page_num = idx + 1;
        host.ensure_alive()?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }

        transition(GenerationStage::Rendering);
        let rendered = render::render_page(content.as_ref(), target, page_num, timeout).await?;

        transition(GenerationStage::Compositing);
        let (encoded, placement) = tokio::task::spawn_blocking(move || {
            let composited = composite(rendered, composite_opts);
            let placement = composited.placement;
            transition(GenerationStage::Encoding);
            encode_image(composited.image, level).map(|encoded| (encoded, placement))
        })
        .await
        .map_err(|e| PdfError::Internal(format!("Encode task panicked: {}", e)))?
        .map_err(|e| PdfError::Internal(format!("Image encoding failed on page {page_num}: {e}")))?;

        let encoded_bytes = encoded.encoded_len();
        backend.add_page(encoded, placement)?;
        debug!("Embedded page {}/{} ({} bytes)", page_num, total, encoded_bytes);

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total, encoded_bytes);
        }
    }

    // ── Step 5: Finish ───────────────────────────────────────────────────
    host.ensure_alive()?;
    tokio::task::spawn_blocking(move || backend.finish())
        .await
        .map_err(|e| PdfError::Internal(format!("Write task panicked: {}", e)))?
}
