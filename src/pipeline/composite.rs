//! Page compositing: reconcile a rendered buffer with the physical page.
//!
//! Buffers are normally drawn at `page_points × render_scale` pixels. Such a
//! buffer passes through untouched and only a `1 / render_scale` placement is
//! recorded. A buffer larger than the page budget in either direction is
//! shrunk uniformly to fit. It is never cropped and never split across
//! extra pages. Smaller buffers keep their natural size and sit at the
//! top-left corner.
//!
//! Placement is expressed in top-left page space (points, y growing down),
//! matching the buffer's row order. The PDF writer converts it to PDF's
//! bottom-left user space.

use crate::config::PageSize;
use crate::page::RenderedPage;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, warn};

/// Where and how large a composited image is drawn on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Points per image pixel, horizontally.
    pub scale_x: f32,
    /// Points per image pixel, vertically.
    pub scale_y: f32,
    /// Left edge of the image, in points from the page's left edge.
    pub origin_x: f32,
    /// Top edge of the image, in points from the page's top edge.
    pub origin_y: f32,
}

impl Placement {
    pub fn uniform(scale: f32) -> Self {
        Self {
            scale_x: scale,
            scale_y: scale,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    /// Size in points of a `width × height` pixel image under this placement.
    pub fn drawn_size(&self, width: u32, height: u32) -> (f32, f32) {
        (width as f32 * self.scale_x, height as f32 * self.scale_y)
    }
}

/// Options the compositor reads from [`crate::PdfConfig`].
#[derive(Debug, Clone, Copy)]
pub struct CompositeOptions {
    pub page_size: PageSize,
    /// Resample overflowing buffers instead of shrinking them only via the transform.
    pub downsample_overflow: bool,
}

/// A normalised image ready for encoding, plus its placement.
#[derive(Debug)]
pub struct CompositedPage {
    pub image: RgbaImage,
    pub placement: Placement,
}

/// Composite one rendered page. Consumes the buffer.
pub fn composite(page: RenderedPage, opts: CompositeOptions) -> CompositedPage {
    let RenderedPage { image, scale } = page;
    let (width, height) = image.dimensions();
    let (budget_w, budget_h) = opts.page_size.to_pixels(scale);

    if width <= budget_w && height <= budget_h {
        debug!(
            "Composite {}x{} px within {}x{} px budget, placement 1/{}",
            width, height, budget_w, budget_h, scale
        );
        return CompositedPage {
            image,
            placement: Placement::uniform(1.0 / scale),
        };
    }

    // Overflow: uniform fit, no cropping.
    let fit = (budget_w as f32 / width as f32).min(budget_h as f32 / height as f32);
    warn!(
        "Page content {}x{} px overflows {}x{} px budget, scaling by {:.4}",
        width, height, budget_w, budget_h, fit
    );

    if opts.downsample_overflow {
        let new_w = ((width as f32 * fit).round() as u32).clamp(1, budget_w);
        let new_h = ((height as f32 * fit).round() as u32).clamp(1, budget_h);
        let resized = imageops::resize(&image, new_w, new_h, FilterType::Triangle);
        drop(image);
        let placement = Placement::uniform(fit_scale(opts.page_size, 1.0 / scale, new_w, new_h));
        CompositedPage {
            image: resized,
            placement,
        }
    } else {
        let placement = Placement::uniform(fit_scale(opts.page_size, fit / scale, width, height));
        CompositedPage { image, placement }
    }
}

/// `preferred` points-per-pixel, reduced if rounding would push the image past the page edge.
fn fit_scale(page: PageSize, preferred: f32, width: u32, height: u32) -> f32 {
    preferred
        .min(page.width / width as f32)
        .min(page.height / height as f32)
}
