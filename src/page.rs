//! Page descriptors and the render-collaborator seam.
//!
//! A page descriptor is anything implementing [`PageContent`]: given a
//! [`RenderTarget`] it asynchronously produces one [`RenderedPage`], an owned
//! RGBA buffer. The generator calls descriptors strictly in registration
//! order and consumes each buffer exactly once.
//!
//! Three adapters cover the common cases without hand-writing the trait:
//!
//! | Registration | Collaborator |
//! |--------------|--------------|
//! | [`PageScope::page_async`] | `Fn(RenderTarget) -> impl Future<Output = Result<RenderedPage, RenderError>>` |
//! | [`PageScope::page_fn`]    | `Fn(RenderTarget) -> Result<RenderedPage, RenderError>` |
//! | [`PageScope::page_image`] | a pre-rendered [`RgbaImage`] |

use crate::config::{PageSize, PdfConfig};
use crate::error::RenderError;
use futures::future::{self, BoxFuture, FutureExt};
use image::RgbaImage;
use std::fmt;
use std::future::Future;

/// What a render collaborator is asked to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    /// Physical page size in points.
    pub page_size: PageSize,
    /// Pixels per point.
    pub scale: f32,
    /// `page_size.width × scale`, rounded.
    pub width_px: u32,
    /// `page_size.height × scale`, rounded.
    pub height_px: u32,
}

impl RenderTarget {
    pub fn new(page_size: PageSize, scale: f32) -> Self {
        let (width_px, height_px) = page_size.to_pixels(scale);
        Self {
            page_size,
            scale,
            width_px,
            height_px,
        }
    }

    /// A blank (transparent) buffer of exactly the target dimensions.
    pub fn blank(&self) -> RgbaImage {
        RgbaImage::new(self.width_px, self.height_px)
    }
}

/// One rendered page: an owned RGBA buffer plus the scale it was drawn at.
pub struct RenderedPage {
    pub image: RgbaImage,
    pub scale: f32,
}

impl RenderedPage {
    pub fn new(image: RgbaImage, scale: f32) -> Self {
        Self { image, scale }
    }

    /// A buffer drawn for `target` (uses the target's scale).
    pub fn for_target(image: RgbaImage, target: &RenderTarget) -> Self {
        Self::new(image, target.scale)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedPage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("scale", &self.scale)
            .finish()
    }
}

/// The render collaborator for one page.
///
/// Implementations must be `Send + Sync` so a [`DocumentSpec`] can move onto
/// a runtime worker ([`crate::stream::generate_stream`]).
pub trait PageContent: Send + Sync {
    fn render(&self, target: RenderTarget) -> BoxFuture<'_, Result<RenderedPage, RenderError>>;
}

/// Adapter for an async closure.
pub struct AsyncPage<F>(pub F);

impl<F, Fut> PageContent for AsyncPage<F>
where
    F: Fn(RenderTarget) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RenderedPage, RenderError>> + Send + 'static,
{
    fn render(&self, target: RenderTarget) -> BoxFuture<'_, Result<RenderedPage, RenderError>> {
        (self.0)(target).boxed()
    }
}

/// Adapter for a synchronous closure.
pub struct FnPage<F>(pub F);

impl<F> PageContent for FnPage<F>
where
    F: Fn(RenderTarget) -> Result<RenderedPage, RenderError> + Send + Sync,
{
    fn render(&self, target: RenderTarget) -> BoxFuture<'_, Result<RenderedPage, RenderError>> {
        future::ready((self.0)(target)).boxed()
    }
}

/// A buffer rendered ahead of time.
///
/// The buffer is cloned on render because a descriptor may be rendered more
/// than once (e.g. the same document generated twice).
pub struct ImagePage {
    image: RgbaImage,
    scale: Option<f32>,
}

impl ImagePage {
    /// Use the document's render scale for this buffer.
    pub fn new(image: RgbaImage) -> Self {
        Self { image, scale: None }
    }

    /// Declare the scale the buffer was drawn at.
    pub fn with_scale(image: RgbaImage, scale: f32) -> Self {
        Self {
            image,
            scale: Some(scale),
        }
    }
}

impl PageContent for ImagePage {
    fn render(&self, target: RenderTarget) -> BoxFuture<'_, Result<RenderedPage, RenderError>> {
        let scale = self.scale.unwrap_or(target.scale);
        future::ready(Ok(RenderedPage::new(self.image.clone(), scale))).boxed()
    }
}

/// Ordered registration of page descriptors.
#[derive(Default)]
pub struct PageScope {
    pages: Vec<Box<dyn PageContent>>,
}

impl PageScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. Output pages follow registration order.
    pub fn page(&mut self, content: impl PageContent + 'static) -> &mut Self {
        self.pages.push(Box::new(content));
        self
    }

    pub fn page_async<F, Fut>(&mut self, render: F) -> &mut Self
    where
        F: Fn(RenderTarget) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RenderedPage, RenderError>> + Send + 'static,
    {
        self.page(AsyncPage(render))
    }

    pub fn page_fn<F>(&mut self, render: F) -> &mut Self
    where
        F: Fn(RenderTarget) -> Result<RenderedPage, RenderError> + Send + Sync + 'static,
    {
        self.page(FnPage(render))
    }

    pub fn page_image(&mut self, image: RgbaImage) -> &mut Self {
        self.page(ImagePage::new(image))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<Box<dyn PageContent>> {
        self.pages
    }
}

/// Everything one generation needs. Immutable once handed to the generator.
pub struct DocumentSpec {
    config: PdfConfig,
    pages: Vec<Box<dyn PageContent>>,
}

impl DocumentSpec {
    pub fn new(config: PdfConfig, pages: Vec<Box<dyn PageContent>>) -> Self {
        Self { config, pages }
    }

    /// Build a document with the same closure style as [`crate::generate_pdf`].
    pub fn build(config: PdfConfig, pages: impl FnOnce(&mut PageScope)) -> Self {
        let mut scope = PageScope::new();
        pages(&mut scope);
        Self::new(config, scope.into_pages())
    }

    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut PdfConfig {
        &mut self.config
    }

    pub fn pages(&self) -> &[Box<dyn PageContent>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The target every page is rendered against.
    pub fn render_target(&self) -> RenderTarget {
        RenderTarget::new(self.config.page_size, self.config.render_scale)
    }
}

impl fmt::Debug for DocumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSpec")
            .field("config", &self.config)
            .field("pages", &self.pages.len())
            .finish()
    }
}
