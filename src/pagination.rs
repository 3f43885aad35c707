use std::path::PathBuf;

/// One sheet's worth of a month's images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a> {
    /// 1-based
    pub number: usize,
    pub total_pages: usize,
    /// 0-based position of the first image of this page within the month
    pub start: usize,
    pub images: &'a [PathBuf],
    /// Image count of the whole month
    pub total_images: usize,
    pub has_more_pages: bool,
}

impl Page<'_> {
    pub fn is_multi_page(&self) -> bool {
        self.total_pages > 1
    }
}

/// Number of pages needed for `image_count` images, `ceil(n / m)`
pub fn page_count(image_count: usize, max_per_page: usize) -> usize {
    image_count.div_ceil(max_per_page.max(1))
}

/// Lazily yields the pages of a month, in order.
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    images: &'a [PathBuf],
    max_per_page: usize,
    total_pages: usize,
    next_number: usize,
}

impl<'a> Pages<'a> {
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Page `number` (1-based), or `None` past the last page
    pub fn page(&self, number: usize) -> Option<Page<'a>> {
        if number == 0 {
            return None;
        }

        let start = (number - 1).checked_mul(self.max_per_page)?;
        if start >= self.images.len() {
            return None;
        }
        let end = (start + self.max_per_page).min(self.images.len());

        Some(Page {
            number,
            total_pages: self.total_pages,
            start,
            images: &self.images[start..end],
            total_images: self.images.len(),
            has_more_pages: end < self.images.len(),
        })
    }
}

impl<'a> Iterator for Pages<'a> {
    type Item = Page<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.page(self.next_number)?;
        self.next_number += 1;
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total_pages + 1).saturating_sub(self.next_number);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pages<'_> {}

/// Splits `images` into pages of at most `max_per_page`.
///
/// Returns `None` when there is nothing to render, so callers can skip the
/// month instead of producing an empty sheet.
pub fn paginate(images: &[PathBuf], max_per_page: usize) -> Option<Pages<'_>> {
    if images.is_empty() {
        return None;
    }
    let max_per_page = max_per_page.max(1);

    Some(Pages {
        images,
        max_per_page,
        total_pages: page_count(images.len(), max_per_page),
        next_number: 1,
    })
}
