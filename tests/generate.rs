//! Integration tests for edgequake-page2pdf.
//!
//! Every test generates real documents into a temp directory (or memory) and
//! reads them back with `lopdf` + `flate2`, so no external viewer or
//! renderer is needed.
//!
//! Run with:
//!   cargo test --test generate -- --nocapture

use edgequake_page2pdf::{
    generate_document, generate_pdf, generate_stream, inspect, inspect_bytes, DocumentSpec,
    ErrorKind, GeneratedPdf, GenerationEvent, HostConfig, HostContext, HostHandle, OutputTarget,
    PageSize, PdfConfig, RenderError, RenderTarget, RenderedPage,
};
use flate2::read::ZlibDecoder;
use futures::StreamExt;
use image::{Rgba, RgbaImage};
use lopdf::{Document, ObjectId};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn host_in(dir: &TempDir) -> HostContext {
    HostContext::init(HostConfig::with_output_directory(dir.path())).expect("host init")
}

fn config(size: PageSize, scale: f32, file_name: &str) -> PdfConfig {
    PdfConfig::builder()
        .page_size(size)
        .render_scale(scale)
        .file_name(file_name)
        .build()
        .expect("valid config")
}

fn solid(target: &RenderTarget, rgb: [u8; 3]) -> RenderedPage {
    let img = RgbaImage::from_pixel(
        target.width_px,
        target.height_px,
        Rgba([rgb[0], rgb[1], rgb[2], 255]),
    );
    RenderedPage::for_target(img, target)
}

fn load(pdf: &GeneratedPdf) -> Document {
    match pdf.bytes() {
        Some(bytes) => Document::load_mem(bytes).expect("parse in-memory PDF"),
        None => Document::load(pdf.path().expect("file output")).expect("parse PDF file"),
    }
}

fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// (width, height, decoded RGB samples) of the page's full-page image.
fn page_image(doc: &Document, page_id: ObjectId) -> (i64, i64, Vec<u8>) {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
    let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();

    let width = stream.dict.get(b"Width").unwrap().as_i64().unwrap();
    let height = stream.dict.get(b"Height").unwrap().as_i64().unwrap();
    let mut samples = Vec::new();
    ZlibDecoder::new(stream.content.as_slice())
        .read_to_end(&mut samples)
        .expect("FlateDecode");
    (width, height, samples)
}

fn dir_entries(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

// ── Page counts ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn page_count_matches_registered_pages() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);

    for n in [1usize, 2, 5] {
        let name = format!("count-{n}.pdf");
        let pdf = generate_pdf(&host.handle(), &config(PageSize::A5, 1.0, &name), |p| {
            for _ in 0..n {
                p.page_fn(|t| Ok(solid(&t, [200, 200, 200])));
            }
        })
        .await
        .expect("generation succeeds");

        assert_eq!(pdf.page_count, n);
        assert_eq!(inspect(pdf.path().unwrap()).unwrap().page_count, n);
        assert_eq!(pdf.path().unwrap(), dir.path().canonicalize().unwrap().join(&name));
    }
}

#[tokio::test]
async fn empty_page_list_is_unknown_error() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);

    let err = generate_pdf(&host.handle(), &config(PageSize::A4, 2.0, "empty.pdf"), |_| {})
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.to_string(), "No pages defined");
    assert!(dir_entries(dir.path()).is_empty());
}

// ── Host context ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn uninitialised_host_is_not_initialized() {
    let err = generate_pdf(
        &HostHandle::uninitialized(),
        &config(PageSize::A4, 1.0, "x.pdf"),
        |p| {
            p.page_image(RgbaImage::new(4, 4));
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
}

#[tokio::test]
async fn dropped_host_is_context_lost() {
    let dir = tempfile::tempdir().unwrap();
    let handle = host_in(&dir).handle();

    let err = generate_pdf(&handle, &config(PageSize::A4, 1.0, "x.pdf"), |p| {
        p.page_image(RgbaImage::new(4, 4));
    })
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContextLost);
}

#[tokio::test]
async fn surface_lost_during_render_is_context_lost() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);

    let err = generate_pdf(&host.handle(), &config(PageSize::A4, 1.0, "x.pdf"), |p| {
        p.page_fn(|_t| Err(RenderError::SurfaceLost));
    })
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContextLost);
    assert!(!dir.path().join("x.pdf").exists());
}

// ── Content ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn solid_colour_round_trips_losslessly() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let colour = [12, 34, 250];

    let pdf = generate_pdf(&host.handle(), &config(PageSize::A5, 1.0, "colour.pdf"), |p| {
        p.page_fn(move |t| Ok(solid(&t, colour)));
    })
    .await
    .unwrap();

    let doc = load(&pdf);
    let (w, h, samples) = page_image(&doc, page_ids(&doc)[0]);
    assert_eq!((w, h), (420, 595));
    assert_eq!(samples.len(), 420 * 595 * 3);
    assert!(samples.chunks_exact(3).all(|px| px == colour));
}

#[tokio::test]
async fn pages_keep_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let colours = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];

    let pdf = generate_pdf(&host.handle(), &config(PageSize::A5, 0.5, "abc.pdf"), |p| {
        for (i, colour) in colours.into_iter().enumerate() {
            // Earlier pages take longer, so any reordering would show up.
            let delay = 30 - 10 * i as u64;
            p.page_async(move |t| async move {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                Ok(solid(&t, colour))
            });
        }
    })
    .await
    .unwrap();

    let doc = load(&pdf);
    let firsts: Vec<[u8; 3]> = page_ids(&doc)
        .into_iter()
        .map(|id| {
            let (_, _, samples) = page_image(&doc, id);
            [samples[0], samples[1], samples[2]]
        })
        .collect();
    assert_eq!(firsts, colours.to_vec());
}

#[tokio::test]
async fn identical_inputs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let draw = |t: RenderTarget| -> Result<RenderedPage, RenderError> {
        let img = RgbaImage::from_fn(t.width_px, t.height_px, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 99, 255])
        });
        Ok(RenderedPage::for_target(img, &t))
    };

    let mut outputs = Vec::new();
    for name in ["first.pdf", "second.pdf"] {
        let pdf = generate_pdf(&host.handle(), &config(PageSize::A5, 1.0, name), |p| {
            p.page_fn(draw);
            p.page_fn(draw);
        })
        .await
        .unwrap();
        outputs.push(std::fs::read(pdf.path().unwrap()).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

// ── Overflow ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overflowing_page_is_scaled_not_split() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);

    let pdf = generate_pdf(&host.handle(), &config(PageSize::A5, 1.0, "tall.pdf"), |p| {
        // Three page-heights of content on one descriptor.
        p.page_fn(|t| {
            let img = RgbaImage::from_pixel(t.width_px, t.height_px * 3, Rgba([0, 0, 0, 255]));
            Ok(RenderedPage::for_target(img, &t))
        });
        p.page_fn(|t| Ok(solid(&t, [255, 255, 255])));
    })
    .await
    .unwrap();

    assert_eq!(pdf.page_count, 2);
    let doc = load(&pdf);
    let ids = page_ids(&doc);
    assert_eq!(ids.len(), 2);

    let (w, h, _) = page_image(&doc, ids[0]);
    assert!(h <= 595, "image height {h} exceeds page budget");
    assert!(w <= 420);
    assert!(h >= 594, "overflowing image should fill the page height, got {h}");
}

// ── Scenario: A4 at 2× ──────────────────────────────────────────────────────

#[tokio::test]
async fn a4_white_page_at_double_scale() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let size = PageSize::new(595.0, 842.0).unwrap();

    let pdf = generate_pdf(&host.handle(), &config(size, 2.0, "a4.pdf"), |p| {
        p.page_fn(|t| {
            assert_eq!((t.width_px, t.height_px), (1190, 1684));
            Ok(solid(&t, [255, 255, 255]))
        });
    })
    .await
    .unwrap();

    assert_eq!(pdf.page_count, 1);
    let summary = inspect(pdf.path().unwrap()).unwrap();
    assert_eq!(summary.page_count, 1);
    assert_eq!(summary.page_sizes, vec![PageSize::A4]);

    let doc = load(&pdf);
    let (w, h, _) = page_image(&doc, page_ids(&doc)[0]);
    assert_eq!((w, h), (1190, 1684));
}

// ── Failure cleanup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn render_failure_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);

    let err = generate_pdf(&host.handle(), &config(PageSize::A5, 1.0, "broken.pdf"), |p| {
        p.page_fn(|t| Ok(solid(&t, [1, 2, 3])));
        p.page_fn(|_t| Err(RenderError::failed("chart data missing")));
        p.page_fn(|t| Ok(solid(&t, [4, 5, 6])));
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RenderingFailed);
    assert!(err.to_string().contains("chart data missing"));
    assert!(
        dir_entries(dir.path()).is_empty(),
        "no output or temp file may remain: {:?}",
        dir_entries(dir.path())
    );
}

#[tokio::test]
async fn unwritable_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let config = PdfConfig::builder()
        .output_directory(&blocker)
        .render_scale(1.0)
        .build()
        .unwrap();
    let err = generate_pdf(&host.handle(), &config, |p| {
        p.page_image(RgbaImage::new(2, 2));
    })
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoError);
}

#[tokio::test]
async fn cancelled_generation_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let config = config(PageSize::A5, 1.0, "cancelled.pdf");

    let spec = DocumentSpec::build(config, |p| {
        p.page_fn(|t| Ok(solid(&t, [0, 0, 0])));
        p.page_async(|_t| async {
            // Never settles.
            futures::future::pending::<()>().await;
            Err(RenderError::failed("unreachable"))
        });
    });

    let handle = host.handle();
    let outcome = tokio::time::timeout(
        std::time::Duration::from_millis(200),
        generate_document(&handle, &spec),
    )
    .await;
    assert!(outcome.is_err(), "generation should still be pending");
    assert!(dir_entries(dir.path()).is_empty());
}

// ── Memory backend ───────────────────────────────────────────────────────────

#[tokio::test]
async fn memory_target_returns_parseable_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let config = PdfConfig::builder()
        .page_size(PageSize::LETTER)
        .render_scale(0.5)
        .output_target(OutputTarget::Memory)
        .title("In memory")
        .build()
        .unwrap();

    let pdf = generate_pdf(&host.handle(), &config, |p| {
        p.page_fn(|t| Ok(solid(&t, [9, 9, 9])));
        p.page_fn(|t| Ok(solid(&t, [9, 9, 9])));
    })
    .await
    .unwrap();

    assert_eq!(pdf.uri(), "memory:");
    assert!(dir_entries(dir.path()).is_empty());
    let summary = inspect_bytes(pdf.bytes().unwrap()).unwrap();
    assert_eq!(summary.page_count, 2);
    assert_eq!(summary.title.as_deref(), Some("In memory"));
    assert_eq!(summary.page_sizes, vec![PageSize::LETTER; 2]);
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_ends_with_finished() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let spec = DocumentSpec::build(config(PageSize::A5, 0.5, "streamed.pdf"), |p| {
        p.page_fn(|t| Ok(solid(&t, [1, 1, 1])));
        p.page_fn(|t| Ok(solid(&t, [2, 2, 2])));
        p.page_fn(|t| Ok(solid(&t, [3, 3, 3])));
    });

    let events: Vec<GenerationEvent> = generate_stream(host.handle(), spec).collect().await;
    let completed = events
        .iter()
        .filter(|e| matches!(e, GenerationEvent::PageCompleted { .. }))
        .count();
    assert_eq!(completed, 3);

    match events.last() {
        Some(GenerationEvent::Finished(Ok(pdf))) => {
            assert_eq!(pdf.page_count, 3);
            assert!(pdf.path().unwrap().exists());
        }
        other => panic!("expected Finished(Ok), got {other:?}"),
    }
}

#[tokio::test]
async fn result_serialises_for_the_cli() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_in(&dir);
    let pdf = generate_pdf(&host.handle(), &config(PageSize::A5, 0.5, "json.pdf"), |p| {
        p.page_image(RgbaImage::new(10, 10));
    })
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::to_value(&pdf).unwrap();
    assert_eq!(json["page_count"], 1);
    assert_eq!(json["location"]["kind"], "file");
    assert!(json["location"]["uri"].as_str().unwrap().starts_with("file://"));
}
