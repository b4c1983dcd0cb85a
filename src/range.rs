//! Page ranges: clamping requested intervals to a document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An inclusive, 1-based span of pages that is valid for some document.
///
/// Always satisfies `1 <= from <= to <= page_count` for the document it was
/// clamped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    from: u32,
    to: u32,
}

impl PageRange {
    /// Clamp a requested `(from, to)` interval to `page_count` pages.
    ///
    /// Out-of-range input is always corrected, never rejected:
    /// `from <= 0` becomes 1, `from > page_count` becomes `page_count`,
    /// a negative `to` or one past the end becomes `page_count`, and a `to`
    /// below `from` is raised to `from`.
    ///
    /// Returns `None` only for a document without pages.
    pub fn clamp(from: i64, to: i64, page_count: u32) -> Option<Self> {
        if page_count == 0 {
            return None;
        }
        let count = i64::from(page_count);

        let from = if from <= 0 {
            1
        } else if from > count {
            count
        } else {
            from
        };

        let mut to = if to < 0 || to > count { count } else { to };
        if to < from {
            to = from;
        }

        Some(Self {
            from: from as u32,
            to: to as u32,
        })
    }

    /// The whole document.
    pub fn all(page_count: u32) -> Option<Self> {
        Self::clamp(1, -1, page_count)
    }

    /// Build a range from already-valid bounds.
    ///
    /// Intended for splitting an existing range; panics if `from` is zero
    /// or `to < from`.
    pub(crate) fn new_unchecked(from: u32, to: u32) -> Self {
        debug_assert!(from >= 1 && from <= to, "invalid page range {}-{}", from, to);
        Self { from, to }
    }

    /// First page (1-based, inclusive).
    pub fn from(&self) -> u32 {
        self.from
    }

    /// Last page (1-based, inclusive).
    pub fn to(&self) -> u32 {
        self.to
    }

    /// Number of pages covered.
    pub fn len(&self) -> u32 {
        self.to - self.from + 1
    }

    /// A valid range is never empty; provided for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `page` lies inside the range.
    pub fn contains(&self, page: u32) -> bool {
        (self.from..=self.to).contains(&page)
    }

    /// Iterate over the page numbers in ascending order.
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.from..=self.to
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// A page interval as requested by a caller, before it is clamped to a
/// document.
///
/// `to = -1` means "through the last page".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested first page
    pub from: i64,
    /// Requested last page
    pub to: i64,
}

impl PageRequest {
    /// Request every page of the document.
    pub const ALL: PageRequest = PageRequest { from: 1, to: -1 };

    /// Create a request for `from..=to`.
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// Resolve against a document with `page_count` pages.
    pub fn resolve(&self, page_count: u32) -> Option<PageRange> {
        PageRange::clamp(self.from, self.to, page_count)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromStr for PageRequest {
    type Err = Error;

    /// Parse `"all"`, `"5"`, `"3-7"`, `"4-"` or `"-9"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL);
        }

        let parse = |part: &str| -> Result<i64> {
            part.trim()
                .parse::<i64>()
                .map_err(|_| Error::InvalidPageRange(format!("invalid page number '{}'", part)))
        };

        match s.split_once('-') {
            Some((start, end)) => {
                let from = if start.trim().is_empty() { 1 } else { parse(start)? };
                let to = if end.trim().is_empty() { -1 } else { parse(end)? };
                Ok(Self::new(from, to))
            }
            None => {
                let page = parse(s)?;
                Ok(Self::new(page, page))
            }
        }
    }
}
