//! Configuration types for bitmap-to-PDF generation.
//!
//! All generation behaviour is controlled through [`PdfConfig`], built via
//! its [`PdfConfigBuilder`]. One struct for every knob keeps configs cheap to
//! clone into worker tasks and easy to log.

use crate::error::PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Physical page dimensions in typographic points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A3 (297 mm × 420 mm).
    pub const A3: PageSize = PageSize { width: 842.0, height: 1191.0 };
    /// ISO A4 (210 mm × 297 mm).
    pub const A4: PageSize = PageSize { width: 595.0, height: 842.0 };
    /// ISO A5 (148 mm × 210 mm).
    pub const A5: PageSize = PageSize { width: 420.0, height: 595.0 };
    /// US Letter (8.5" × 11").
    pub const LETTER: PageSize = PageSize { width: 612.0, height: 792.0 };
    /// US Legal (8.5" × 14").
    pub const LEGAL: PageSize = PageSize { width: 612.0, height: 1008.0 };
    /// US Tabloid (11" × 17").
    pub const TABLOID: PageSize = PageSize { width: 792.0, height: 1224.0 };

    /// Create a page size, rejecting zero, negative, and non-finite sides.
    pub fn new(width: f32, height: f32) -> Result<Self, PdfError> {
        let size = PageSize { width, height };
        size.validate()?;
        Ok(size)
    }

    /// Look up a named preset (case-insensitive): a3, a4, a5, letter, legal, tabloid.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a3" => Some(Self::A3),
            "a4" => Some(Self::A4),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::LETTER),
            "legal" => Some(Self::LEGAL),
            "tabloid" => Some(Self::TABLOID),
            _ => None,
        }
    }

    /// The same page rotated by 90°.
    pub fn landscape(self) -> Self {
        PageSize {
            width: self.height,
            height: self.width,
        }
    }

    /// Pixel dimensions of this page at `scale` pixels per point.
    ///
    /// Rounds to the nearest pixel and never returns a zero side.
    pub fn to_pixels(&self, scale: f32) -> (u32, u32) {
        let px = |pt: f32| ((pt * scale).round() as u32).max(1);
        (px(self.width), px(self.height))
    }

    pub(crate) fn validate(&self) -> Result<(), PdfError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if !ok(self.width) || !ok(self.height) {
            return Err(PdfError::InvalidConfig(format!(
                "page size must be positive, got {}×{}pt",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}pt", self.width, self.height)
    }
}

/// Where the finished document goes. Selects the [`crate::backend::PdfBackend`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputTarget {
    /// Persist to `<output_directory>/<file_name>`.
    File,
    /// Keep the serialised document in memory.
    Memory,
}

impl Default for OutputTarget {
    #[cfg(not(target_arch = "wasm32"))]
    fn default() -> Self {
        OutputTarget::File
    }

    #[cfg(target_arch = "wasm32")]
    fn default() -> Self {
        OutputTarget::Memory
    }
}

/// Configuration for one PDF generation.
///
/// Built via [`PdfConfig::builder()`] or using [`PdfConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_page2pdf::{PageSize, PdfConfig};
///
/// let config = PdfConfig::builder()
///     .page_size(PageSize::LETTER)
///     .file_name("report.pdf")
///     .render_scale(3.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PdfConfig {
    /// Physical size of every page. Default: A4.
    pub page_size: PageSize,

    /// Output file name. Default: `"document.pdf"`.
    pub file_name: String,

    /// Output directory. If None, uses the host context's directory.
    pub output_directory: Option<PathBuf>,

    /// Pixels per point requested from the render collaborator. Range: 0.5–8. Default: 2.
    ///
    /// Rendering at 2× keeps text crisp when the PDF is zoomed or printed
    /// while keeping a full A4 page around 8 MB of raw RGBA.
    pub render_scale: f32,

    /// Backend variant. Default: File (Memory on wasm32).
    pub output_target: OutputTarget,

    /// Flate level 0–9 for embedded image streams. Default: 6.
    pub compression_level: u32,

    /// Resample overflowing buffers down to the page pixel budget. Default: true.
    ///
    /// When false the oversized buffer is embedded as-is and only the
    /// placement transform shrinks it.
    pub downsample_overflow: bool,

    /// Per-page render timeout in seconds. Default: None (wait indefinitely).
    pub render_timeout_secs: Option<u64>,

    /// Document title written to the Info dictionary.
    pub title: Option<String>,

    /// Document author written to the Info dictionary.
    pub author: Option<String>,

    /// Producer written to the Info dictionary. Default: "edgequake-page2pdf".
    pub producer: Option<String>,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

pub const DEFAULT_FILE_NAME: &str = "document.pdf";

/// Accepted range for [`PdfConfig::render_scale`].
pub const MIN_RENDER_SCALE: f32 = 0.5;
pub const MAX_RENDER_SCALE: f32 = 8.0;

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            file_name: DEFAULT_FILE_NAME.to_string(),
            output_directory: None,
            render_scale: 2.0,
            output_target: OutputTarget::default(),
            compression_level: 6,
            downsample_overflow: true,
            render_timeout_secs: None,
            title: None,
            author: None,
            producer: Some(env!("CARGO_PKG_NAME").to_string()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PdfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfConfig")
            .field("page_size", &self.page_size)
            .field("file_name", &self.file_name)
            .field("output_directory", &self.output_directory)
            .field("render_scale", &self.render_scale)
            .field("output_target", &self.output_target)
            .field("compression_level", &self.compression_level)
            .field("downsample_overflow", &self.downsample_overflow)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("title", &self.title)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl PdfConfig {
    /// Create a new builder for `PdfConfig`.
    pub fn builder() -> PdfConfigBuilder {
        PdfConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the invariants the builder enforces. Public fields can be set
    /// directly, so the generator re-checks before starting.
    pub fn validate(&self) -> Result<(), PdfError> {
        self.page_size.validate()?;
        validate_file_name(&self.file_name)?;
        if !(MIN_RENDER_SCALE..=MAX_RENDER_SCALE).contains(&self.render_scale) {
            return Err(PdfError::InvalidConfig(format!(
                "render scale must be within {MIN_RENDER_SCALE}–{MAX_RENDER_SCALE}, got {}",
                self.render_scale
            )));
        }
        if self.compression_level > 9 {
            return Err(PdfError::InvalidConfig(format!(
                "compression level must be 0–9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

fn validate_file_name(name: &str) -> Result<(), PdfError> {
    if name.trim().is_empty() {
        return Err(PdfError::InvalidConfig("file name must not be empty".into()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PdfError::InvalidConfig(format!(
            "file name must not contain path separators, got '{name}'"
        )));
    }
    Ok(())
}

/// Builder for [`PdfConfig`].
#[derive(Debug)]
pub struct PdfConfigBuilder {
    config: PdfConfig,
}

impl PdfConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.config.file_name = name.into();
        self
    }

    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_directory = Some(dir.into());
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = if scale.is_finite() {
            scale.clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE)
        } else {
            scale
        };
        self
    }

    pub fn output_target(mut self, target: OutputTarget) -> Self {
        self.config.output_target = target;
        self
    }

    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level.min(9);
        self
    }

    pub fn downsample_overflow(mut self, v: bool) -> Self {
        self.config.downsample_overflow = v;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = Some(secs);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = Some(author.into());
        self
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.config.producer = Some(producer.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PdfConfig, PdfError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults_match_the_documented_values() {
        let c = PdfConfig::default();
        assert_eq!(c.page_size, PageSize::A4);
        assert_eq!(c.file_name, "document.pdf");
        assert_eq!(c.render_scale, 2.0);
        assert!(c.downsample_overflow);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn a4_at_double_scale() {
        assert_eq!(PageSize::A4.to_pixels(2.0), (1190, 1684));
    }

    #[test]
    fn to_pixels_never_returns_zero() {
        let tiny = PageSize::new(0.1, 0.1).unwrap();
        assert_eq!(tiny.to_pixels(1.0), (1, 1));
    }

    #[test]
    fn page_size_rejects_degenerate_sides() {
        for (w, h) in [(0.0, 10.0), (10.0, -1.0), (f32::NAN, 10.0), (10.0, f32::INFINITY)] {
            let err = PageSize::new(w, h).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unknown);
        }
    }

    #[test]
    fn preset_lookup_is_case_insensitive() {
        assert_eq!(PageSize::from_name("Letter"), Some(PageSize::LETTER));
        assert_eq!(PageSize::from_name(" TABLOID "), Some(PageSize::TABLOID));
        assert_eq!(PageSize::from_name("b5"), None);
    }

    #[test]
    fn landscape_swaps_sides() {
        let l = PageSize::A4.landscape();
        assert_eq!((l.width, l.height), (842.0, 595.0));
    }

    #[test]
    fn builder_clamps_scale() {
        let c = PdfConfig::builder().render_scale(100.0).build().unwrap();
        assert_eq!(c.render_scale, 8.0);
        let c = PdfConfig::builder().render_scale(0.01).build().unwrap();
        assert_eq!(c.render_scale, 0.5);
    }

    #[test]
    fn builder_rejects_nan_scale() {
        assert!(PdfConfig::builder().render_scale(f32::NAN).build().is_err());
    }

    #[test]
    fn builder_rejects_bad_file_names() {
        assert!(PdfConfig::builder().file_name("").build().is_err());
        assert!(PdfConfig::builder().file_name("a/b.pdf").build().is_err());
        assert!(PdfConfig::builder().file_name("..").build().is_err());
        assert!(PdfConfig::builder().file_name("ok.pdf").build().is_ok());
    }

    #[test]
    fn builder_rejects_invalid_page_size() {
        let bad = PageSize {
            width: 0.0,
            height: 842.0,
        };
        let err = PdfConfig::builder().page_size(bad).build().unwrap_err();
        assert!(err.to_string().contains("page size"), "got: {err}");
    }

    #[test]
    fn validate_rejects_scale_set_past_the_builder() {
        for scale in [100.0, 0.1, 0.0, -2.0, f32::INFINITY] {
            let mut c = PdfConfig::default();
            c.render_scale = scale;
            let err = c.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unknown);
            assert!(err.to_string().contains("render scale"), "got: {err}");
        }
        let mut c = PdfConfig::default();
        c.render_scale = MAX_RENDER_SCALE;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn compression_level_is_capped() {
        let c = PdfConfig::builder().compression_level(42).build().unwrap();
        assert_eq!(c.compression_level, 9);
    }
}
