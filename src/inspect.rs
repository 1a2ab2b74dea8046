//! Read a PDF back and summarise its structure.
//!
//! Used by `page2pdf --inspect` and handy in tests: it answers "how many
//! pages, what size, which metadata" without a full PDF renderer.

use crate::config::PageSize;
use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Page tree depth limit when resolving inherited attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// Structural summary of a PDF document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfSummary {
    /// Header version, e.g. `"1.7"`.
    pub version: String,
    pub page_count: usize,
    /// MediaBox of every page, in page order.
    pub page_sizes: Vec<PageSize>,
    pub title: Option<String>,
    pub producer: Option<String>,
}

/// Summarise the PDF at `path`.
pub fn inspect(path: impl AsRef<Path>) -> Result<PdfSummary, PdfError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| PdfError::io(path, e))?;
    debug!("Inspecting {} ({} bytes)", path.display(), bytes.len());
    inspect_bytes(&bytes)
}

/// Summarise an in-memory PDF.
pub fn inspect_bytes(bytes: &[u8]) -> Result<PdfSummary, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::CorruptPdf(e.to_string()))?;

    let pages = doc.get_pages();
    let page_sizes = pages
        .values()
        .map(|&id| media_box(&doc, id))
        .collect::<Result<Vec<_>, _>>()?;

    let info = info_dict(&doc);
    Ok(PdfSummary {
        version: doc.version.clone(),
        page_count: pages.len(),
        page_sizes,
        title: info.and_then(|d| text_entry(d, b"Title")),
        producer: info.and_then(|d| text_entry(d, b"Producer")),
    })
}

fn info_dict(doc: &Document) -> Option<&Dictionary> {
    let id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    doc.get_dictionary(id).ok()
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// MediaBox of a page, following `/Parent` for inherited values.
fn media_box(doc: &Document, page_id: ObjectId) -> Result<PageSize, PdfError> {
    let mut node = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::CorruptPdf(format!("page {page_id:?}: {e}")))?;

    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(Object::Array(rect)) = node.get(b"MediaBox") {
            return rect_size(rect);
        }
        let parent = node
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id));
        match parent {
            Ok(dict) => node = dict,
            Err(_) => break,
        }
    }
    Err(PdfError::CorruptPdf(format!(
        "page {page_id:?} has no MediaBox"
    )))
}

fn rect_size(rect: &[Object]) -> Result<PageSize, PdfError> {
    let nums: Vec<f32> = rect.iter().filter_map(number).collect();
    match nums.as_slice() {
        [x0, y0, x1, y1] => PageSize::new((x1 - x0).abs(), (y1 - y0).abs()),
        _ => Err(PdfError::CorruptPdf("MediaBox is not a rectangle".into())),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
