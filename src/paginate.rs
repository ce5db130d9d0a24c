//! Stateless pagination with a windowed page-number sequence.
//!
//! The window shows at most three consecutive pages around the current one,
//! pins the first and last page, and marks skipped ranges with an ellipsis:
//!
//! ```text
//! 12 pages, page 6:  1 … 5 6 7 … 12
//! 12 pages, page 1:  1 2 3 … 12
//! ```

use anyhow::{Result, bail};
use serde::{Serialize, Serializer};
use std::num::NonZeroUsize;

/// Products per page on catalog listings.
pub const DEFAULT_PAGE_SIZE: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    pub fn new(size: usize) -> Result<Self> {
        match NonZeroUsize::new(size) {
            Some(size) => Ok(Self(size)),
            None => bail!("page size must be greater than zero"),
        }
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// One entry of the navigation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLink::Page(number) => serializer.serialize_u64(*number as u64),
            PageLink::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

/// Previous/next targets plus the numbered window, present only when there
/// is more than one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageControls {
    pub previous: Option<usize>,
    pub next: Option<usize>,
    pub window: Vec<PageLink>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageView<T> {
    pub page_number: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
    pub windowed_page_numbers: Vec<PageLink>,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> PageView<T> {
    /// Navigation controls, or `None` when everything fits on one page.
    pub fn controls(&self) -> Option<PageControls> {
        if self.total_pages <= 1 {
            return None;
        }
        Some(PageControls {
            previous: self.has_prev.then(|| self.page_number - 1),
            next: self.has_next.then(|| self.page_number + 1),
            window: self.windowed_page_numbers.clone(),
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageView<U> {
        PageView {
            page_number: self.page_number,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
            windowed_page_numbers: self.windowed_page_numbers,
            has_prev: self.has_prev,
            has_next: self.has_next,
        }
    }
}

/// Number of pages needed for `len` items.
pub fn total_pages(len: usize, page_size: PageSize) -> usize {
    len.div_ceil(page_size.get())
}

/// Clamp a requested 1-based page into `1..=total_pages` (or 1 when empty).
pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    if requested < 1 || total_pages == 0 {
        return 1;
    }
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    requested.min(total_pages)
}

/// Slice `items` into the requested page.
pub fn paginate<T: Clone>(items: &[T], page_size: PageSize, page_number: i64) -> PageView<T> {
    let total = total_pages(items.len(), page_size);
    let page = clamp_page(page_number, total);
    let start = (page - 1).saturating_mul(page_size.get()).min(items.len());
    let end = start.saturating_add(page_size.get()).min(items.len());

    PageView {
        page_number: page,
        total_pages: total,
        items: items[start..end].to_vec(),
        windowed_page_numbers: if total > 1 {
            page_window(page, total)
        } else {
            Vec::new()
        },
        has_prev: page > 1,
        has_next: page < total,
    }
}

/// Window of page links around `current` for `total` pages.
pub fn page_window(current: usize, total: usize) -> Vec<PageLink> {
    if total == 0 {
        return Vec::new();
    }
    // Signed so that `total - 2` stays meaningful for one- and two-page sets.
    let current = current as i64;
    let total = total as i64;

    let mut start = (current - 1).max(1);
    let mut end = (current + 1).min(total);
    if current <= 2 {
        end = total.min(3);
    }
    if current > total - 2 {
        start = (total - 2).max(1);
    }

    let mut links = Vec::with_capacity(7);
    if start > 1 {
        links.push(PageLink::Page(1));
        if start > 2 {
            links.push(PageLink::Ellipsis);
        }
    }
    links.extend((start..=end).map(|page| PageLink::Page(page as usize)));
    if end < total {
        if end < total - 1 {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(total as usize));
    }
    links
}
