use serde::Serialize;

/// Window requested from the loader when the page changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

/// 1-based page cursor over a remote list. The page number moves only after
/// the loader accepted the new window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    items_count: u64,
    page_number: u64,
    page_limit: u64,
}

impl Pagination {
    pub fn new(items_count: u64, page_limit: u64) -> Self {
        Self {
            items_count,
            page_number: 1,
            page_limit: page_limit.max(1),
        }
    }

    pub fn items_count(&self) -> u64 {
        self.items_count
    }

    pub fn set_items_count(&mut self, items_count: u64) {
        self.items_count = items_count;
    }

    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    pub fn page_limit(&self) -> u64 {
        self.page_limit
    }

    /// Never below one, so an empty list still has a (first and last) page.
    pub fn pages_count(&self) -> u64 {
        self.items_count.div_ceil(self.page_limit).max(1)
    }

    pub fn is_first_page(&self) -> bool {
        self.page_number == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.page_number >= self.pages_count()
    }

    pub fn current(&self) -> PageRequest {
        self.request_for(self.page_number)
    }

    fn request_for(&self, page_number: u64) -> PageRequest {
        PageRequest {
            offset: (page_number - 1) * self.page_limit,
            limit: self.page_limit,
        }
    }

    fn try_change_page<E: std::fmt::Display>(
        &mut self,
        page_number: u64,
        loader: impl FnOnce(PageRequest) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Err(e) = loader(self.request_for(page_number)) {
            tracing::error!(page_number, error = %e, "page load failed");
            return Err(e);
        }
        self.page_number = page_number;
        Ok(())
    }

    pub fn to_first<E: std::fmt::Display>(
        &mut self,
        loader: impl FnOnce(PageRequest) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.is_first_page() {
            return Ok(());
        }
        self.try_change_page(1, loader)
    }

    pub fn to_prev<E: std::fmt::Display>(
        &mut self,
        loader: impl FnOnce(PageRequest) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.is_first_page() {
            return Ok(());
        }
        self.try_change_page(self.page_number - 1, loader)
    }

    pub fn to_next<E: std::fmt::Display>(
        &mut self,
        loader: impl FnOnce(PageRequest) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.is_last_page() {
            return Ok(());
        }
        self.try_change_page(self.page_number + 1, loader)
    }

    pub fn to_last<E: std::fmt::Display>(
        &mut self,
        loader: impl FnOnce(PageRequest) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.is_last_page() {
            return Ok(());
        }
        self.try_change_page(self.pages_count(), loader)
    }

    /// Changes the page size and reloads, clamping the page number into the
    /// new page range. The limit is kept even if the reload fails.
    pub fn set_page_limit<E: std::fmt::Display>(
        &mut self,
        page_limit: u64,
        loader: impl FnOnce(PageRequest) -> Result<(), E>,
    ) -> Result<(), E> {
        self.page_limit = page_limit.max(1);
        let page_number = self.page_number.min(self.pages_count());
        self.try_change_page(page_number, loader)
    }
}
