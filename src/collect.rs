//! Recursive collection of raster images from page resources.

use image::DynamicImage;

use crate::backend::{PdfBackend, XObject};
use crate::decode::decode_image;
use crate::range::PageRange;

/// Forms nested deeper than this are not descended into.
pub const MAX_FORM_DEPTH: usize = 32;

/// A decoded image together with the page it was found on.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// 1-based page number
    pub source_page: u32,
    /// Decoded raster
    pub image: DynamicImage,
}

/// Collect every image reachable from `resources`.
///
/// Images come out in dictionary order; a form XObject contributes its own
/// images, depth first, at the position where it appears. A resource that
/// cannot be resolved or decoded is logged and skipped.
pub fn collect_images<B: PdfBackend>(backend: &B, resources: &B::Resources) -> Vec<DynamicImage> {
    let mut images = Vec::new();
    collect_into(backend, resources, 0, &mut images);
    images
}

fn collect_into<B: PdfBackend>(
    backend: &B,
    resources: &B::Resources,
    depth: usize,
    images: &mut Vec<DynamicImage>,
) {
    for name in backend.xobject_names(resources) {
        let shown = String::from_utf8_lossy(&name);
        match backend.resolve_xobject(resources, &name) {
            Ok(XObject::Image(encoded)) => match decode_image(&encoded) {
                Ok(image) => images.push(image),
                Err(e) => log::warn!("Skipping image {}: {}", shown, e),
            },
            Ok(XObject::Form(nested)) => {
                if depth + 1 >= MAX_FORM_DEPTH {
                    log::warn!("Form {} nested {} levels deep, not descending", shown, depth + 1);
                    continue;
                }
                collect_into(backend, &nested, depth + 1, images);
            }
            Ok(XObject::Other) => log::trace!("Ignoring non-image XObject {}", shown),
            Err(e) => log::warn!("Error when extracting XObject {}, skipping: {}", shown, e),
        }
    }
}

/// Collect the images on a single 1-based page.
pub fn collect_page<B: PdfBackend>(backend: &B, page: u32) -> Vec<ImageRecord> {
    let resources = match backend.page_resources(page) {
        Ok(Some(resources)) => resources,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Cannot read resources of page {}: {}", page, e);
            return Vec::new();
        }
    };

    collect_images(backend, &resources)
        .into_iter()
        .map(|image| ImageRecord {
            source_page: page,
            image,
        })
        .collect()
}

/// Collect the images on every page of `range`, last page included.
pub fn collect_range<B: PdfBackend>(backend: &B, range: PageRange) -> Vec<ImageRecord> {
    log::info!("Extracting images from pages {}", range);
    range
        .pages()
        .flat_map(|page| collect_page(backend, page))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::EncodedImage;
    use crate::error::{Error, Result};
    use std::collections::HashMap;

    /// Resource dictionaries identified by index into `MockBackend::dicts`.
    #[derive(Default)]
    struct MockBackend {
        dicts: Vec<Vec<(Vec<u8>, Entry)>>,
        pages: HashMap<u32, usize>,
    }

    #[derive(Clone)]
    enum Entry {
        Image(EncodedImage),
        Form(usize),
        Broken,
        Other,
    }

    impl MockBackend {
        fn dict(&mut self, entries: Vec<(&str, Entry)>) -> usize {
            self.dicts.push(
                entries
                    .into_iter()
                    .map(|(n, e)| (n.as_bytes().to_vec(), e))
                    .collect(),
            );
            self.dicts.len() - 1
        }
    }

    impl PdfBackend for MockBackend {
        type Resources = usize;

        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn extract_text(&self, _range: PageRange) -> Result<String> {
            Ok(String::new())
        }

        fn page_resources(&self, page: u32) -> Result<Option<usize>> {
            Ok(self.pages.get(&page).copied())
        }

        fn xobject_names(&self, resources: &usize) -> Vec<Vec<u8>> {
            self.dicts[*resources].iter().map(|(n, _)| n.clone()).collect()
        }

        fn resolve_xobject(&self, resources: &usize, name: &[u8]) -> Result<XObject<usize>> {
            let (_, entry) = self.dicts[*resources]
                .iter()
                .find(|(n, _)| n.as_slice() == name)
                .ok_or_else(|| Error::PdfParse(String::from_utf8_lossy(name).into_owned()))?;
            match entry {
                Entry::Image(img) => Ok(XObject::Image(img.clone())),
                Entry::Form(idx) => Ok(XObject::Form(*idx)),
                Entry::Broken => Err(Error::PdfParse("dangling reference".into())),
                Entry::Other => Ok(XObject::Other),
            }
        }
    }

    /// 1x1 gray image whose single pixel value identifies it.
    fn marker(value: u8) -> Entry {
        Entry::Image(EncodedImage::raw(1, 1, "DeviceGray", vec![value]))
    }

    fn markers(images: &[DynamicImage]) -> Vec<u8> {
        images.iter().map(|i| i.to_luma8().get_pixel(0, 0).0[0]).collect()
    }

    #[test]
    fn test_direct_then_nested_order() {
        let mut backend = MockBackend::default();
        let form = backend.dict(vec![("Im1", marker(2)), ("Im2", marker(3))]);
        let page = backend.dict(vec![("Im0", marker(1)), ("Fm0", Entry::Form(form))]);

        let images = collect_images(&backend, &page);
        assert_eq!(markers(&images), vec![1, 2, 3]);
    }

    #[test]
    fn test_form_position_is_respected() {
        let mut backend = MockBackend::default();
        let form = backend.dict(vec![("Im1", marker(20))]);
        let page = backend.dict(vec![
            ("Fm0", Entry::Form(form)),
            ("Im0", marker(10)),
            ("Xx", Entry::Other),
        ]);

        assert_eq!(markers(&collect_images(&backend, &page)), vec![20, 10]);
    }

    #[test]
    fn test_failures_are_skipped() {
        let mut backend = MockBackend::default();
        let bad_image = Entry::Image(EncodedImage::raw(4, 4, "DeviceRGB", vec![0; 3]));
        let page = backend.dict(vec![
            ("Im0", marker(1)),
            ("Im1", bad_image),
            ("Im2", Entry::Broken),
            ("Im3", marker(4)),
        ]);

        assert_eq!(markers(&collect_images(&backend, &page)), vec![1, 4]);
    }

    #[test]
    fn test_depth_guard_stops_self_referencing_form() {
        let mut backend = MockBackend::default();
        // dict 0 contains an image and a form pointing back at itself
        backend.dicts.push(vec![
            (b"Im0".to_vec(), marker(7)),
            (b"Fm0".to_vec(), Entry::Form(0)),
        ]);

        let images = collect_images(&backend, &0);
        assert_eq!(images.len(), MAX_FORM_DEPTH);
    }

    #[test]
    fn test_collect_range_includes_last_page() {
        let mut backend = MockBackend::default();
        let p1 = backend.dict(vec![("Im0", marker(1))]);
        let p3 = backend.dict(vec![("Im0", marker(3)), ("Im1", marker(4))]);
        backend.pages.insert(1, p1);
        backend.pages.insert(3, p3);
        // page 2 has no resources

        let records = collect_range(&backend, PageRange::clamp(1, 3, 3).unwrap());
        let pages: Vec<u32> = records.iter().map(|r| r.source_page).collect();
        assert_eq!(pages, vec![1, 3, 3]);

        let only_last = collect_range(&backend, PageRange::clamp(3, 3, 3).unwrap());
        assert_eq!(only_last.len(), 2);
    }
}
