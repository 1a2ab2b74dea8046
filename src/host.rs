//! Host context: the one-time initialisation record every generation needs.
//!
//! The host is created once at startup with [`HostContext::init`] and owned
//! by the application (typically alongside its window or activity). The
//! generator never owns it; it receives a [`HostHandle`], a non-owning
//! handle that is checked for liveness before each page is rendered and
//! again before the document is written.
//!
//! ```text
//! HostContext (owner, Arc)  ──handle()──▶  HostHandle (Weak)
//!        │                                     │
//!   invalidate() / drop                  acquire() → Ok / ContextLost
//! ```
//!
//! A default-constructed `HostHandle` was never initialised and reports
//! [`PdfError::NotInitialized`]; a handle whose context was invalidated or
//! dropped reports [`PdfError::ContextLost`].

use crate::error::PdfError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Environment variable overriding the default output directory.
pub const OUTPUT_DIR_ENV: &str = "PAGE2PDF_OUTPUT_DIR";

/// Settings captured at initialisation. Read-only afterwards.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Directory used when a [`crate::PdfConfig`] has no `output_directory`.
    pub output_directory: PathBuf,
}

impl Default for HostConfig {
    /// Default locations:
    /// - `$PAGE2PDF_OUTPUT_DIR` when set
    /// - otherwise `<Documents>/pdfs` (e.g. `~/Documents/pdfs`)
    /// - otherwise `<temp>/pdfs`
    fn default() -> Self {
        let output_directory = std::env::var_os(OUTPUT_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::document_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("pdfs")
            });
        Self { output_directory }
    }
}

impl HostConfig {
    pub fn with_output_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: dir.into(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct HostState {
    config: HostConfig,
    alive: AtomicBool,
}

impl HostState {
    pub(crate) fn output_directory(&self) -> &Path {
        &self.config.output_directory
    }
}

/// Owner of the host record. Dropping it invalidates every handle.
#[derive(Debug)]
pub struct HostContext {
    state: Arc<HostState>,
}

impl HostContext {
    /// Initialise the host. The output directory is created lazily on first write.
    pub fn init(config: HostConfig) -> Result<Self, PdfError> {
        if config.output_directory.as_os_str().is_empty() {
            return Err(PdfError::InvalidConfig(
                "host output directory must not be empty".into(),
            ));
        }
        info!(
            "PDF host initialised (output directory: {})",
            config.output_directory.display()
        );
        Ok(Self {
            state: Arc::new(HostState {
                config,
                alive: AtomicBool::new(true),
            }),
        })
    }

    /// A non-owning handle to pass into generator calls.
    pub fn handle(&self) -> HostHandle {
        HostHandle {
            state: Some(Arc::downgrade(&self.state)),
        }
    }

    pub fn output_directory(&self) -> &Path {
        self.state.output_directory()
    }

    /// Mark the host as gone (e.g. its window closed) without dropping it.
    ///
    /// In-flight generations fail with [`PdfError::ContextLost`] at their
    /// next liveness check.
    pub fn invalidate(&self) {
        if self.state.alive.swap(false, Ordering::SeqCst) {
            debug!("PDF host invalidated");
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state.alive.load(Ordering::SeqCst)
    }
}

/// Weak handle to a [`HostContext`].
#[derive(Debug, Clone, Default)]
pub struct HostHandle {
    state: Option<Weak<HostState>>,
}

impl HostHandle {
    /// A handle that was never bound to a host. Equivalent to `HostHandle::default()`.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Upgrade the handle, failing with `NotInitialized` or `ContextLost`.
    pub(crate) fn acquire(&self) -> Result<Arc<HostState>, PdfError> {
        let weak = self.state.as_ref().ok_or(PdfError::NotInitialized)?;
        let state = weak.upgrade().ok_or(PdfError::ContextLost)?;
        if !state.alive.load(Ordering::SeqCst) {
            return Err(PdfError::ContextLost);
        }
        Ok(state)
    }

    /// Liveness check without keeping the host alive.
    pub fn ensure_alive(&self) -> Result<(), PdfError> {
        self.acquire().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }
}
