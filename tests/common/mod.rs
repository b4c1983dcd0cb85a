//! Shared helpers for building small PDFs with lopdf.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// An XObject placed in a page's resource dictionary.
#[derive(Debug, Clone)]
pub enum Xobj {
    /// 1x1 DeviceGray image whose pixel value identifies it
    Gray(u8),
    /// Form XObject holding 1x1 gray images
    Form(Vec<u8>),
    /// Image whose sample data is too short to decode
    Broken,
    /// 1x1 gray image stored under a raw resource name
    Named(Vec<u8>, u8),
    /// Form XObject with no `/Resources` of its own
    BareForm,
}

/// Builder for multi-page test documents.
#[derive(Debug, Default)]
pub struct PdfBuilder {
    pages: Vec<Vec<Xobj>>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` pages with text only.
    pub fn text_pages(mut self, count: usize) -> Self {
        self.pages.extend((0..count).map(|_| Vec::new()));
        self
    }

    /// One page with text and the given XObjects, in that resource order.
    pub fn page(mut self, xobjects: Vec<Xobj>) -> Self {
        self.pages.push(xobjects);
        self
    }

    pub fn build(self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });

        let mut page_ids = Vec::new();
        for (i, xobjects) in self.pages.iter().enumerate() {
            let content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", i + 1);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
                "Contents" => content_id,
            };
            // pages without images inherit the font from the page tree
            if !xobjects.is_empty() {
                let mut names = Dictionary::new();
                for (j, xobj) in xobjects.iter().enumerate() {
                    let id = add_xobject(&mut doc, xobj);
                    let name = match xobj {
                        Xobj::Named(name, _) => name.clone(),
                        _ => format!("X{}", j).into_bytes(),
                    };
                    names.set(name, id);
                }
                page.set(
                    "Resources",
                    dictionary! {
                        "Font" => dictionary! { "F1" => font_id },
                        "XObject" => names,
                    },
                );
            }
            page_ids.push(doc.add_object(page));
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_ids.len() as i64,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    /// Build and save into `dir/name`.
    pub fn save(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut doc = self.build();
        doc.save(&path).unwrap();
        path
    }
}

fn gray_image(value: u8) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![value],
    )
}

fn add_xobject(doc: &mut Document, xobj: &Xobj) -> ObjectId {
    match xobj {
        Xobj::Gray(value) | Xobj::Named(_, value) => doc.add_object(gray_image(*value)),
        Xobj::Broken => doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![0, 0, 0],
        )),
        Xobj::Form(values) => {
            let mut names = Dictionary::new();
            for (j, value) in values.iter().enumerate() {
                names.set(format!("Im{}", j), doc.add_object(gray_image(*value)));
            }
            doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(1), Object::Integer(1)],
                    "Resources" => dictionary! { "XObject" => names },
                },
                Vec::new(),
            ))
        }
        Xobj::BareForm => doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(1), Object::Integer(1)],
            },
            b"/X0 Do".to_vec(),
        )),
    }
}

/// Pixel value of a 1x1 gray PNG written by the extractor.
pub fn marker(path: &Path) -> u8 {
    image::open(path).unwrap().to_luma8().get_pixel(0, 0).0[0]
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
