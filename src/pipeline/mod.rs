//! Pipeline stages for bitmap-to-PDF generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and a backend can reuse the later stages unchanged.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ composite ──▶ encode ──▶ write
//! (collaborator) (fit)     (flate)    (lopdf)
//! ```
//!
//! 1. [`render`]: await the page's render collaborator and validate the buffer
//! 2. [`composite`]: fit the buffer to the physical page, produce a placement
//! 3. [`encode`]: split RGBA into RGB + soft mask, zlib-compress; CPU-bound,
//!    run in `spawn_blocking`
//! 4. [`write`]: append the image as a full page and serialise the document

pub mod composite;
pub mod encode;
pub mod render;
pub mod write;
