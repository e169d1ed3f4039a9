pub const PAGE_SIZE: u32 = 4;

/// Results shown per market: two pages.
pub const MAX_RESULTS: u32 = 8;

/// Page index of the market news list (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsPager {
    page_index: u32,
    total_results: u32,
}

impl NewsPager {
    pub fn new() -> Self {
        Self {
            page_index: 1,
            total_results: MAX_RESULTS,
        }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn total_results(&self) -> u32 {
        self.total_results
    }

    /// Record the result count reported by the feed, capped at two pages.
    pub fn set_total_results(&mut self, total: u32) {
        self.total_results = total.min(MAX_RESULTS);
        self.page_index = self.page_index.min(self.page_count());
    }

    fn page_count(&self) -> u32 {
        self.total_results.div_ceil(PAGE_SIZE).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.page_count()
    }

    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }

    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page_index += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Page to load in the background so "Next" is instant.
    pub fn prefetch_index(&self) -> Option<u32> {
        self.has_next().then_some(self.page_index + 1)
    }

    pub fn summary(&self) -> String {
        if self.total_results == 0 {
            return "Showing 0 to 0 of 0 results".to_string();
        }
        let first = (self.page_index - 1) * PAGE_SIZE + 1;
        let last = (self.page_index * PAGE_SIZE).min(self.total_results);
        format!(
            "Showing {} to {} of {} results",
            first, last, self.total_results
        )
    }
}

impl Default for NewsPager {
    fn default() -> Self {
        Self::new()
    }
}
