use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::num::NonZeroUsize;
use std::ops::Range;

/// Number of cells shown per page. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Desktop grid.
    pub const DEFAULT: PageSize = PageSize(NonZeroUsize::new(20).unwrap());
    /// Narrow mobile grid.
    pub const COMPACT: PageSize = PageSize(NonZeroUsize::new(14).unwrap());

    /// `None` for zero.
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.get() as u64)
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let size = usize::deserialize(deserializer)?;
        PageSize::new(size).ok_or_else(|| serde::de::Error::custom("page size must be at least 1"))
    }
}

/// Slices a list of cell indices into fixed-size pages.
///
/// The window is independent of cell contents. It does not clamp: callers
/// that take a page number from user input go through [`clamp_page`](Self::clamp_page) first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationWindow {
    page_size: PageSize,
}

impl PaginationWindow {
    pub fn new(page_size: PageSize) -> Self {
        Self { page_size }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Page count for `len` items; an empty list still has one (empty) page.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size.get()).max(1)
    }

    /// Bring `page` into `[0, total_pages - 1]`.
    pub fn clamp_page(&self, page: usize, len: usize) -> usize {
        page.min(self.total_pages(len) - 1)
    }

    /// Positions covered by `page`, cut at `len`. Empty past the end.
    pub fn page_range(&self, page: usize, len: usize) -> Range<usize> {
        let start = page.saturating_mul(self.page_size.get()).min(len);
        let end = start.saturating_add(self.page_size.get()).min(len);
        start..end
    }

    pub fn visible<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        &items[self.page_range(page, items.len())]
    }
}

/// Indices shown on `page`: a plain slice, no clamping.
pub fn visible_indices<T>(all: &[T], page: usize, page_size: PageSize) -> &[T] {
    PaginationWindow::new(page_size).visible(all, page)
}
