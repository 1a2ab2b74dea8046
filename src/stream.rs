//! Streaming generation API: observe a generation as a stream of events.
//!
//! [`crate::generate::generate_document`] resolves once, after the last page
//! is written. [`generate_stream`] runs the same pipeline on a spawned task
//! and yields a [`GenerationEvent`] for every step, which suits UIs that
//! show per-page progress without implementing a callback.
//!
//! Events arrive in pipeline order and [`GenerationEvent::Finished`] is
//! always the last item. Dropping the stream aborts the task, which cancels
//! the generation the same way dropping the future does.

use crate::error::PdfError;
use crate::generate::generate_document;
use crate::host::HostHandle;
use crate::output::PdfResult;
use crate::page::DocumentSpec;
use crate::progress::{GenerationProgressCallback, ProgressCallback};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

/// One step of a streamed generation.
#[derive(Debug)]
pub enum GenerationEvent {
    /// Pages were registered and the document was opened.
    Started { total_pages: usize },
    /// The render collaborator is about to be called for `page_num` (1-indexed).
    PageStarted { page_num: usize, total_pages: usize },
    /// `page_num` has been embedded into the document.
    PageCompleted {
        page_num: usize,
        total_pages: usize,
        encoded_bytes: usize,
    },
    /// The single terminal outcome of the generation.
    Finished(PdfResult),
}

/// Stream returned by [`generate_stream`].
pub struct EventStream {
    events: UnboundedReceiverStream<GenerationEvent>,
    task: JoinHandle<()>,
}

impl Stream for EventStream {
    type Item = GenerationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Forwards progress into the event channel, then to the caller's callback.
struct ChannelCallback {
    tx: UnboundedSender<GenerationEvent>,
    inner: Option<ProgressCallback>,
}

impl ChannelCallback {
    fn send(&self, event: GenerationEvent) {
        // Receiver gone means the stream was dropped; the task is being aborted.
        let _ = self.tx.send(event);
    }
}

impl GenerationProgressCallback for ChannelCallback {
    fn on_generation_start(&self, total_pages: usize) {
        self.send(GenerationEvent::Started { total_pages });
        if let Some(ref cb) = self.inner {
            cb.on_generation_start(total_pages);
        }
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.send(GenerationEvent::PageStarted {
            page_num,
            total_pages,
        });
        if let Some(ref cb) = self.inner {
            cb.on_page_start(page_num, total_pages);
        }
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, encoded_bytes: usize) {
        self.send(GenerationEvent::PageCompleted {
            page_num,
            total_pages,
            encoded_bytes,
        });
        if let Some(ref cb) = self.inner {
            cb.on_page_complete(page_num, total_pages, encoded_bytes);
        }
    }

    fn on_generation_complete(&self, page_count: usize, file_size: u64) {
        if let Some(ref cb) = self.inner {
            cb.on_generation_complete(page_count, file_size);
        }
    }

    fn on_generation_failed(&self, error: &PdfError) {
        if let Some(ref cb) = self.inner {
            cb.on_generation_failed(error);
        }
    }
}

/// Generate a PDF on a background task, streaming its progress.
///
/// Must be called from within a tokio runtime. A progress callback already
/// set on the document's config keeps receiving its events.
///
/// # Example
/// ```rust,no_run
/// use edgequake_page2pdf::{generate_stream, DocumentSpec, GenerationEvent, HostConfig, HostContext, PdfConfig};
/// use futures::StreamExt;
/// use image::RgbaImage;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = HostContext::init(HostConfig::default())?;
/// let spec = DocumentSpec::build(PdfConfig::default(), |p| {
///     p.page_image(RgbaImage::new(1190, 1684));
/// });
///
/// let mut events = generate_stream(host.handle(), spec);
/// while let Some(event) = events.next().await {
///     match event {
///         GenerationEvent::PageCompleted { page_num, total_pages, .. } => {
///             eprintln!("{page_num}/{total_pages}")
///         }
///         GenerationEvent::Finished(result) => println!("{}", result?.uri()),
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn generate_stream(host: HostHandle, mut spec: DocumentSpec) -> EventStream {
    let (tx, rx) = mpsc::unbounded_channel();

    let config = spec.config_mut();
    let forward = ChannelCallback {
        tx: tx.clone(),
        inner: config.progress_callback.take(),
    };
    config.progress_callback = Some(Arc::new(forward));

    let task = tokio::spawn(async move {
        let result = generate_document(&host, &spec).await;
        if tx.send(GenerationEvent::Finished(result)).is_err() {
            warn!("Generation finished after its event stream was dropped");
        }
    });

    EventStream {
        events: UnboundedReceiverStream::new(rx),
        task,
    }
}
