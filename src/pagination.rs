//! Page arithmetic over a record sequence.

/// Number of pages needed for `len` records. Zero when there is nothing to
/// show or `page_size` is zero.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Records of page `page_index`, empty when the index is past the last page.
pub fn page<T>(records: &[T], page_size: usize, page_index: usize) -> &[T] {
    if page_index >= page_count(records.len(), page_size) {
        return &[];
    }
    let begin = page_index * page_size;
    let end = std::cmp::min(begin.saturating_add(page_size), records.len());
    &records[begin..end]
}

/// Largest valid index not above `page_index`.
pub fn clamp(page_index: usize, page_count: usize) -> usize {
    if page_count == 0 {
        0
    } else {
        std::cmp::min(page_index, page_count - 1)
    }
}

pub fn can_go_previous(page_index: usize) -> bool {
    page_index > 0
}

pub fn can_go_next(page_index: usize, page_count: usize) -> bool {
    page_index < page_count.saturating_sub(1)
}

/// Current page and page size of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size,
        }
    }

    pub fn page_count(&self, len: usize) -> usize {
        page_count(len, self.page_size)
    }

    /// Pulls the page index back into range for `len` records.
    /// Returns whether it moved.
    pub fn clamp_to(&mut self, len: usize) -> bool {
        let clamped = clamp(self.page_index, self.page_count(len));
        let moved = clamped != self.page_index;
        self.page_index = clamped;
        moved
    }

    /// Switches to `page_size`, keeping the first row of the current page on
    /// the new current page. Zero is ignored.
    pub fn resize(&mut self, page_size: usize, len: usize) {
        if page_size == 0 {
            return;
        }
        let top_row = self.page_index.saturating_mul(self.page_size);
        self.page_size = page_size;
        self.page_index = top_row / page_size;
        self.clamp_to(len);
    }

    /// Row range `[begin, end)` of the current page for `len` records.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        if self.page_index >= self.page_count(len) {
            return (len, len);
        }
        let begin = self.page_index * self.page_size;
        (begin, std::cmp::min(begin.saturating_add(self.page_size), len))
    }
}
