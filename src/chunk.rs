//! Splitting a page range into fixed-size groups and extracting their text.

use crate::backend::PdfBackend;
use crate::cleanup::CleanupPipeline;
use crate::error::Result;
use crate::range::PageRange;

/// Text of a contiguous group of pages.
#[derive(Debug)]
pub struct TextChunk {
    /// Pages the text was taken from
    pub pages: PageRange,
    /// Extracted text, or why the backend could not produce it
    pub content: Result<String>,
}

/// Split `range` into consecutive groups of at most `every` pages.
///
/// The groups are ascending, do not overlap and cover every page of `range`
/// exactly once; only the last one may be shorter. `every == 0` is treated
/// as 1.
pub fn plan_chunks(range: PageRange, every: u32) -> Vec<PageRange> {
    let every = every.clamp(1, range.len());

    let mut chunks = Vec::with_capacity(range.len().div_ceil(every) as usize);
    let mut start = range.from();
    while start <= range.to() {
        let end = start.saturating_add(every - 1).min(range.to());
        chunks.push(PageRange::new_unchecked(start, end));
        start = end + 1;
    }
    chunks
}

/// Extract the text of each chunk of `range`.
///
/// A chunk whose extraction fails is kept with its error; the rest of the
/// batch is unaffected.
pub fn extract_chunks<B: PdfBackend>(
    backend: &B,
    range: PageRange,
    every: u32,
    cleanup: Option<&CleanupPipeline>,
) -> Vec<TextChunk> {
    plan_chunks(range, every)
        .into_iter()
        .map(|pages| {
            let content = backend.extract_text(pages).map(|text| match cleanup {
                Some(pipeline) => pipeline.process(&text),
                None => text,
            });
            if let Err(e) = &content {
                log::debug!("Failed to extract text from pages {}: {}", pages, e);
            }
            TextChunk { pages, content }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::XObject;
    use crate::error::Error;

    fn range(from: u32, to: u32) -> PageRange {
        PageRange::new_unchecked(from, to)
    }

    fn spans(chunks: &[PageRange]) -> Vec<(u32, u32)> {
        chunks.iter().map(|c| (c.from(), c.to())).collect()
    }

    #[test]
    fn test_uneven_split() {
        let chunks = plan_chunks(range(1, 10), 3);
        assert_eq!(spans(&chunks), vec![(1, 3), (4, 6), (7, 9), (10, 10)]);
    }

    #[test]
    fn test_single_page() {
        assert_eq!(spans(&plan_chunks(range(5, 5), 3)), vec![(5, 5)]);
    }

    #[test]
    fn test_every_larger_than_span() {
        assert_eq!(spans(&plan_chunks(range(2, 4), 10)), vec![(2, 4)]);
    }

    #[test]
    fn test_even_split_has_no_empty_tail() {
        assert_eq!(spans(&plan_chunks(range(1, 12), 4)), vec![(1, 4), (5, 8), (9, 12)]);
        assert_eq!(spans(&plan_chunks(range(1, 12), 5)), vec![(1, 5), (6, 10), (11, 12)]);
    }

    #[test]
    fn test_every_zero_means_one() {
        assert_eq!(spans(&plan_chunks(range(3, 5), 0)), vec![(3, 3), (4, 4), (5, 5)]);
    }

    #[test]
    fn test_coverage_without_gaps_or_overlaps() {
        for from in 1..=9u32 {
            for to in from..=20u32 {
                for every in 1..=25u32 {
                    let chunks = plan_chunks(range(from, to), every);
                    let covered: Vec<u32> = chunks.iter().flat_map(|c| c.pages()).collect();
                    let expected: Vec<u32> = (from..=to).collect();
                    assert_eq!(covered, expected, "from={from} to={to} every={every}");
                    assert!(chunks.iter().all(|c| c.len() <= every));
                    // only the final chunk may be short
                    let short = chunks.iter().filter(|c| c.len() < every.min(to - from + 1));
                    assert!(short.count() <= 1);
                }
            }
        }
    }

    struct FlakyText;

    impl PdfBackend for FlakyText {
        type Resources = ();

        fn page_count(&self) -> u32 {
            9
        }

        fn extract_text(&self, range: PageRange) -> Result<String> {
            if range.contains(5) {
                Err(Error::TextExtract("broken font".into()))
            } else {
                Ok(format!("text {}  \n", range))
            }
        }

        fn page_resources(&self, _page: u32) -> Result<Option<()>> {
            Ok(None)
        }

        fn xobject_names(&self, _resources: &()) -> Vec<Vec<u8>> {
            Vec::new()
        }

        fn resolve_xobject(&self, _resources: &(), _name: &[u8]) -> Result<XObject<()>> {
            Ok(XObject::Other)
        }
    }

    #[test]
    fn test_failed_chunk_does_not_abort() {
        let chunks = extract_chunks(&FlakyText, range(1, 9), 3, None);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content.as_deref().ok(), Some("text 1-3  \n"));
        assert!(matches!(chunks[1].content, Err(Error::TextExtract(_))));
        assert_eq!(chunks[2].content.as_deref().ok(), Some("text 7-9  \n"));
    }

    #[test]
    fn test_cleanup_is_applied() {
        let pipeline = CleanupPipeline::default();
        let chunks = extract_chunks(&FlakyText, range(1, 2), 1, Some(&pipeline));
        assert_eq!(chunks[0].content.as_deref().ok(), Some("text 1\n"));
    }
}
