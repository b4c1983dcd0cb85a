//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the handful of document operations
//! the extractor needs, isolating the concrete PDF library (lopdf) from the
//! chunking and image-collection logic.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::decode::{EncodedImage, ImageFilter};
use crate::error::{Error, Result};
use crate::range::PageRange;
use crate::source::validate_source;

/// An entry of a resource dictionary's `XObject` map, resolved.
#[derive(Debug, Clone)]
pub enum XObject<R> {
    /// A raster image
    Image(EncodedImage),
    /// A form XObject with its own nested resources
    Form(R),
    /// Anything else (PostScript XObjects, forms without resources)
    Other,
}

/// Abstract interface for PDF document access.
///
/// `Resources` is whatever handle the implementation uses for a resource
/// dictionary; it is only ever passed back to the same backend.
pub trait PdfBackend {
    /// Handle for a resource dictionary.
    type Resources;

    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Text of the pages in `range`, in page order.
    fn extract_text(&self, range: PageRange) -> Result<String>;

    /// Resource dictionary of a 1-based page, following inheritance through
    /// the page tree. `None` if the page has no resources at all.
    fn page_resources(&self, page: u32) -> Result<Option<Self::Resources>>;

    /// Names in the `XObject` sub-dictionary, in dictionary order.
    ///
    /// PDF names are byte strings and need not be valid UTF-8.
    fn xobject_names(&self, resources: &Self::Resources) -> Vec<Vec<u8>>;

    /// Resolve a named XObject.
    fn resolve_xobject(&self, resources: &Self::Resources, name: &[u8])
        -> Result<XObject<Self::Resources>>;
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
///
/// Owns the parsed document; dropping the backend releases it.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfBackend {
    /// Open a PDF file, validating the path first.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        validate_source(path)?;

        let doc = LopdfDocument::load(path)?;
        log::debug!("Opened {} ({} objects)", path.display(), doc.objects.len());
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        crate::source::detect_format_from_bytes(data)?;
        Ok(Self::from_document(LopdfDocument::load_mem(data)?))
    }

    /// Wrap an already loaded `lopdf::Document`.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages.get(&page).copied().ok_or_else(|| {
            Error::PdfParse(format!(
                "page {} is out of range (document has {} pages)",
                page,
                self.pages.len()
            ))
        })
    }

    /// Follow a reference (if any) and return the dictionary behind `obj`.
    fn as_dictionary<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Dictionary(d) => Some(d),
            Object::Reference(id) => self.doc.get_dictionary(*id).ok(),
            _ => None,
        }
    }

    fn xobject_dict<'a>(&'a self, resources: &'a Dictionary) -> Option<&'a Dictionary> {
        resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.as_dictionary(obj))
    }

    fn encoded_image(&self, stream: &lopdf::Stream) -> Result<EncodedImage> {
        let dict = &stream.dict;
        let int = |key: &[u8]| dict.get(key).ok().and_then(|o| o.as_i64().ok());

        let width = int(b"Width")
            .ok_or_else(|| Error::DecodeFailure("image has no /Width".into()))?;
        let height = int(b"Height")
            .ok_or_else(|| Error::DecodeFailure("image has no /Height".into()))?;
        let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
        let bits = if is_mask { 1 } else { int(b"BitsPerComponent").unwrap_or(8) };

        let color_space = if is_mask {
            "DeviceGray".to_string()
        } else {
            self.color_space_name(dict)
        };

        let filters = filter_names(dict);
        let image_filter = match filters.last().map(String::as_str) {
            Some("DCTDecode") | Some("DCT") => ImageFilter::Dct,
            Some("JPXDecode") => ImageFilter::Jpx,
            _ => ImageFilter::None,
        };

        // lopdf only strips generic filters; image codecs are left in place
        let data = match (filters.is_empty(), image_filter) {
            (true, _) => stream.content.clone(),
            (false, ImageFilter::None) => stream
                .decompressed_content()
                .map_err(|e| Error::DecodeFailure(format!("stream decode failed: {}", e)))?,
            (false, _) if filters.len() == 1 => stream.content.clone(),
            (false, _) => {
                return Err(Error::DecodeFailure(format!(
                    "unsupported filter chain {:?}",
                    filters
                )))
            }
        };

        Ok(EncodedImage {
            width: u32::try_from(width)
                .map_err(|_| Error::DecodeFailure(format!("invalid width {}", width)))?,
            height: u32::try_from(height)
                .map_err(|_| Error::DecodeFailure(format!("invalid height {}", height)))?,
            bits_per_component: u8::try_from(bits).unwrap_or(8),
            color_space,
            filter: image_filter,
            data,
        })
    }

    fn color_space_name(&self, dict: &Dictionary) -> String {
        let cs = match dict.get(b"ColorSpace") {
            Ok(Object::Reference(id)) => self.doc.get_object(*id).ok(),
            Ok(obj) => Some(obj),
            Err(_) => None,
        };
        match cs {
            Some(Object::Name(n)) => String::from_utf8_lossy(n).to_string(),
            Some(Object::Array(arr)) => arr
                .first()
                .and_then(|o| o.as_name_str().ok())
                .unwrap_or("DeviceRGB")
                .to_string(),
            _ => "DeviceRGB".to_string(),
        }
    }
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name_str().ok().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

impl PdfBackend for LopdfBackend {
    type Resources = Dictionary;

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn extract_text(&self, range: PageRange) -> Result<String> {
        let pages: Vec<u32> = range.pages().collect();
        self.doc
            .extract_text(&pages)
            .map_err(|e| Error::TextExtract(format!("pages {}: {}", range, e)))
    }

    fn page_resources(&self, page: u32) -> Result<Option<Dictionary>> {
        let mut node_id = self.page_id(page)?;

        // Resources is inheritable: walk up through /Parent until found
        for _ in 0..64 {
            let node = self.doc.get_dictionary(node_id)?;
            if let Ok(res) = node.get(b"Resources") {
                return Ok(self.as_dictionary(res).cloned());
            }
            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node_id = parent,
                Err(_) => return Ok(None),
            }
        }
        Err(Error::PdfParse(format!(
            "page tree too deep resolving resources of page {}",
            page
        )))
    }

    fn xobject_names(&self, resources: &Dictionary) -> Vec<Vec<u8>> {
        self.xobject_dict(resources)
            .map(|xobjects| xobjects.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn resolve_xobject(&self, resources: &Dictionary, name: &[u8]) -> Result<XObject<Dictionary>> {
        let xobjects = self
            .xobject_dict(resources)
            .ok_or_else(|| Error::PdfParse("resource dictionary has no /XObject".into()))?;
        let entry = xobjects.get(name)?;

        let stream = match entry {
            Object::Reference(id) => self.doc.get_object(*id)?.as_stream()?,
            Object::Stream(s) => s,
            _ => return Ok(XObject::Other),
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name_str) {
            Ok("Image") => Ok(XObject::Image(self.encoded_image(stream)?)),
            // a form without its own resources draws from the page's, which
            // the caller walks already
            Ok("Form") => Ok(stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|res| self.as_dictionary(res))
                .cloned()
                .map_or(XObject::Other, XObject::Form)),
            _ => Ok(XObject::Other),
        }
    }
}
