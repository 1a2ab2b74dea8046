//! # edgequake-page2pdf
//!
//! Compose rendered page bitmaps into paginated PDF documents.
//!
//! ## Why this crate?
//!
//! Applications that already know how to draw a page (a UI toolkit, a
//! chart renderer, a report template) rarely want to learn PDF as well.
//! This crate takes whatever pixel buffer your renderer produces for each
//! page, fits it onto a fixed-size PDF page, and writes the document: one
//! full-page lossless image per page, in registration order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! pages
//!  │
//!  ├─ 1. Build      register page descriptors, validate config
//!  ├─ 2. Render     ask each descriptor for a buffer at page size × scale
//!  ├─ 3. Composite  fit the buffer into the page (top-left, no cropping)
//!  ├─ 4. Encode     RGBA → Flate DeviceRGB (+ soft mask if translucent)
//!  ├─ 5. Embed      one image XObject + content stream per page
//!  └─ 6. Finish     serialise; atomic rename onto the destination
//! ```
//!
//! Pages flow through steps 2–5 one at a time, so at most one raw page
//! buffer is alive at any moment.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_page2pdf::{generate_pdf, HostConfig, HostContext, PageSize, PdfConfig};
//! use image::{Rgba, RgbaImage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Output directory from PAGE2PDF_OUTPUT_DIR, else ~/Documents/pdfs
//!     let host = HostContext::init(HostConfig::default())?;
//!     let config = PdfConfig::builder()
//!         .page_size(PageSize::A4)
//!         .file_name("invoice.pdf")
//!         .build()?;
//!
//!     let pdf = generate_pdf(&host.handle(), &config, |p| {
//!         p.page_image(RgbaImage::from_pixel(1190, 1684, Rgba([255, 255, 255, 255])));
//!     })
//!     .await?;
//!
//!     println!("{} ({} pages, {} bytes)", pdf.uri(), pdf.page_count, pdf.file_size);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `page2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `system-viewer` | on | [`SystemViewer`] share target via the `open` crate |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-page2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Render Scale
//!
//! | Scale | A4 buffer | Use for |
//! |-------|-----------|---------|
//! | `1.0` | 595 × 842 | Screen previews |
//! | `2.0` | 1190 × 1684 | Default: crisp on screen, fine for office printing |
//! | `4.0` | 2380 × 3368 | Print shops, fine line art |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod generate;
pub mod host;
pub mod inspect;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod progress;
pub mod share;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputTarget, PageSize, PdfConfig, PdfConfigBuilder};
pub use error::{ErrorKind, PdfError, RenderError};
pub use generate::{generate_document, generate_pdf, generate_pdf_sync, GenerationStage};
pub use host::{HostConfig, HostContext, HostHandle};
pub use inspect::{inspect, inspect_bytes, PdfSummary};
pub use output::{GeneratedPdf, PdfLocation, PdfResult};
pub use page::{DocumentSpec, PageContent, PageScope, RenderTarget, RenderedPage};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use share::{share_pdf, NoopShare, ShareTarget};
#[cfg(feature = "system-viewer")]
pub use share::SystemViewer;
pub use stream::{generate_stream, EventStream, GenerationEvent};
