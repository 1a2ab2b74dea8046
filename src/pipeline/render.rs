//! Page rendering: drive one page's render collaborator to a validated buffer.
//!
//! The collaborator may need several scheduler passes to settle (layout,
//! image loading, fonts), so this is a true suspension point. Rendering
//! happens on the caller's task, never in parallel with another page, because
//! UI toolkits behind a collaborator are rarely safe for concurrent use.
//!
//! The buffer is validated here rather than in the compositor: a zero-sized
//! image or a non-positive scale is the collaborator's fault and is reported
//! as a rendering failure for that page.

use crate::error::{PdfError, RenderError};
use crate::page::{PageContent, RenderTarget, RenderedPage};
use std::time::Duration;
use tracing::debug;

/// Render page `page_num` (1-indexed) against `target`.
pub async fn render_page(
    content: &dyn PageContent,
    target: RenderTarget,
    page_num: usize,
    timeout: Option<Duration>,
) -> Result<RenderedPage, PdfError> {
    let render = content.render(target);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, render).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::TimedOut {
                secs: limit.as_secs(),
            }),
        },
        None => render.await,
    };

    let page = result.map_err(|e| PdfError::from_render(page_num, e))?;
    validate(&page, page_num)?;

    debug!(
        "Rendered page {} → {}x{} px at {}x",
        page_num,
        page.width(),
        page.height(),
        page.scale
    );
    Ok(page)
}

fn validate(page: &RenderedPage, page_num: usize) -> Result<(), PdfError> {
    if page.width() == 0 || page.height() == 0 {
        return Err(PdfError::RenderingFailed {
            page: page_num,
            detail: format!("empty buffer ({}x{} px)", page.width(), page.height()),
        });
    }
    if !page.scale.is_finite() || page.scale <= 0.0 {
        return Err(PdfError::RenderingFailed {
            page: page_num,
            detail: format!("invalid render scale {}", page.scale),
        });
    }
    Ok(())
}
