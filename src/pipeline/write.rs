//! PDF assembly with `lopdf`: one full-page image XObject per page.
//!
//! # Coordinate System
//!
//! PDF user space has a **bottom-left origin** (y grows upward) while the
//! compositor places images in **top-left** page space (y grows downward,
//! matching the buffer's row order). For an image drawn `h` points tall at
//! top-left offset `(x, y_top)`:
//!
//! ```text
//! pdf_y = page_height - y_top - h
//! ```
//!
//! The `cm` matrix `[w 0 0 h x pdf_y]` then maps the image's unit square onto
//! the page. PDF image space already puts the first sample row at the top of
//! that square, so the top-to-bottom buffer lands upright with no negative
//! y scale.
//!
//! # Determinism
//!
//! Object ids are allocated in call order and the Info dictionary carries no
//! timestamps, so identical pages always serialise to identical bytes.

use super::composite::Placement;
use super::encode::EncodedImage;
use crate::config::PageSize;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

const PDF_VERSION: &str = "1.7";
const IMAGE_NAME: &str = "Im0";

/// Document-level metadata for the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
}

/// An open document: pages are appended in call order.
pub struct DocumentWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page_size: PageSize,
    info: DocumentInfo,
}

impl DocumentWriter {
    pub fn new(page_size: PageSize, info: DocumentInfo) -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        // Reserved up front: every page points at it as /Parent.
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page_size,
            info,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append a page showing `image` under `placement`. Consumes the image.
    pub fn add_page(&mut self, image: EncodedImage, placement: Placement) -> lopdf::Result<()> {
        let EncodedImage {
            width,
            height,
            rgb,
            alpha,
        } = image;

        let smask_id = alpha.map(|samples| {
            self.doc.add_object(Stream::new(
                image_dict(width, height, "DeviceGray"),
                samples,
            ))
        });

        let mut dict = image_dict(width, height, "DeviceRGB");
        if let Some(id) = smask_id {
            dict.set("SMask", Object::Reference(id));
        }
        let image_id = self.doc.add_object(Stream::new(dict, rgb));

        let content = self.draw_image_ops(width, height, placement);
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let resources = Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([(
                IMAGE_NAME,
                Object::Reference(image_id),
            )])),
        )]);

        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            ("MediaBox", media_box(self.page_size)),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        self.page_ids.push(page_id);
        Ok(())
    }

    /// `q w 0 0 h x y cm /Im0 Do Q` with the top-left → bottom-left flip applied.
    fn draw_image_ops(&self, width: u32, height: u32, placement: Placement) -> Content {
        let (draw_w, draw_h) = placement.drawn_size(width, height);
        let x = placement.origin_x;
        let y = self.page_size.height - placement.origin_y - draw_h;
        Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(draw_w),
                        0.into(),
                        0.into(),
                        Object::Real(draw_h),
                        Object::Real(x),
                        Object::Real(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        }
    }

    /// Close the page tree, write the trailer, and serialise into `target`.
    pub fn write_to<W: Write>(mut self, target: &mut W) -> lopdf::Result<()> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let info = info_dict(&self.info);
        if !info.is_empty() {
            let info_id = self.doc.add_object(info);
            self.doc.trailer.set("Info", Object::Reference(info_id));
        }

        self.doc.save_to(target)?;
        Ok(())
    }
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ])
}

fn media_box(size: PageSize) -> Object {
    Object::Array(vec![
        0.into(),
        0.into(),
        Object::Real(size.width),
        Object::Real(size.height),
    ])
}

fn info_dict(info: &DocumentInfo) -> Dictionary {
    let mut dict = Dictionary::new();
    let fields = [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Producer", &info.producer),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            dict.set(key, Object::String(v.as_bytes().to_vec(), StringFormat::Literal));
        }
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_image;
    use image::{Rgba, RgbaImage};

    fn real(obj: &Object) -> f32 {
        match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            other => panic!("not a number: {other:?}"),
        }
    }

    fn one_page(size: PageSize, img: RgbaImage, placement: Placement) -> Document {
        let mut writer = DocumentWriter::new(size, DocumentInfo::default());
        writer
            .add_page(encode_image(img, 6).unwrap(), placement)
            .unwrap();
        let mut buf = Vec::new();
        writer.write_to(&mut buf).unwrap();
        Document::load_mem(&buf).unwrap()
    }

    fn first_page_ops(doc: &Document) -> Vec<Operation> {
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    #[test]
    fn media_box_matches_page_size() {
        let doc = one_page(
            PageSize::A4,
            RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])),
            Placement::uniform(0.5),
        );
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page = doc.get_object(pages[&1]).unwrap().as_dict().unwrap();
        let mbox = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let dims: Vec<f32> = mbox.iter().map(real).collect();
        assert_eq!(dims, vec![0.0, 0.0, 595.0, 842.0]);
    }

    #[test]
    fn full_page_image_is_drawn_from_origin() {
        let doc = one_page(
            PageSize::A4,
            RgbaImage::from_pixel(1190, 1684, Rgba([0, 0, 0, 255])),
            Placement::uniform(0.5),
        );
        let ops = first_page_ops(&doc);
        let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
        let m: Vec<f32> = cm.operands.iter().map(real).collect();
        assert_eq!(m, vec![595.0, 0.0, 0.0, 842.0, 0.0, 0.0]);
        assert!(ops.iter().any(|op| op.operator == "Do"));
    }

    #[test]
    fn short_image_is_anchored_to_top_edge() {
        let doc = one_page(
            PageSize::new(100.0, 200.0).unwrap(),
            RgbaImage::from_pixel(100, 50, Rgba([0, 0, 0, 255])),
            Placement::uniform(1.0),
        );
        let ops = first_page_ops(&doc);
        let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
        let m: Vec<f32> = cm.operands.iter().map(real).collect();
        // 50pt tall image at the top of a 200pt page starts at y = 150.
        assert_eq!(m, vec![100.0, 0.0, 0.0, 50.0, 0.0, 150.0]);
    }

    #[test]
    fn translucent_image_gets_soft_mask() {
        let doc = one_page(
            PageSize::A5,
            RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])),
            Placement::uniform(1.0),
        );
        let has_smask = doc.objects.values().any(|obj| {
            matches!(obj, Object::Stream(s) if s.dict.get(b"SMask").is_ok())
        });
        assert!(has_smask);
    }

    #[test]
    fn info_dictionary_is_written() {
        let mut writer = DocumentWriter::new(
            PageSize::A4,
            DocumentInfo {
                title: Some("Quarterly".into()),
                author: None,
                producer: Some("edgequake-page2pdf".into()),
            },
        );
        writer
            .add_page(
                encode_image(RgbaImage::new(1, 1), 6).unwrap(),
                Placement::uniform(1.0),
            )
            .unwrap();
        let mut buf = Vec::new();
        writer.write_to(&mut buf).unwrap();
        let doc = Document::load_mem(&buf).unwrap();
        let info_ref = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_ref).unwrap().as_dict().unwrap();
        assert!(matches!(
            info.get(b"Title").unwrap(),
            Object::String(title, _) if title.as_slice() == b"Quarterly"
        ));
        assert!(info.get(b"Author").is_err());
    }

    #[test]
    fn identical_input_serialises_identically() {
        let build = || {
            let mut writer = DocumentWriter::new(PageSize::A5, DocumentInfo::default());
            let img = RgbaImage::from_fn(8, 8, |x, y| Rgba([x as u8, y as u8, 0, 255]));
            writer
                .add_page(encode_image(img, 6).unwrap(), Placement::uniform(1.0))
                .unwrap();
            let mut buf = Vec::new();
            writer.write_to(&mut buf).unwrap();
            buf
        };
        assert_eq!(build(), build());
    }
}
