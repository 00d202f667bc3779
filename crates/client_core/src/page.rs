use crate::error::FetchError;

/// One page of a remote collection. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub has_more: bool,
    pub has_previous: bool,
    pub total_count: Option<u64>,
    pub total_pages: Option<u32>,
}

impl<T> Page<T> {
    pub fn next_token(&self) -> Option<u32> {
        self.has_more.then_some(self.page + 1)
    }
}

/// Client-side bookkeeping for one collection.
///
/// `page == 0` means nothing has been loaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub has_more: bool,
    pub has_previous: bool,
    pub total_count: Option<u64>,
    pub total_pages: Option<u32>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            has_more: false,
            has_previous: false,
            total_count: None,
            total_pages: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> PageState<T> {
    pub fn is_loaded(&self) -> bool {
        self.page > 0
    }

    pub fn can_load_more(&self) -> bool {
        !self.is_loading && self.has_more
    }

    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
    }

    /// Supersedes the current items with `page`.
    pub(crate) fn replace(&mut self, page: Page<T>) {
        self.items = page.items;
        self.absorb_meta(
            page.page,
            page.has_more,
            page.has_previous,
            page.total_count,
            page.total_pages,
        );
    }

    /// Appends `page`, skipping items whose key is already present.
    pub(crate) fn append_unique<K, F>(&mut self, page: Page<T>, key: F)
    where
        K: PartialEq,
        F: Fn(&T) -> K,
    {
        for item in page.items {
            let item_key = key(&item);
            if !self.items.iter().any(|existing| key(existing) == item_key) {
                self.items.push(item);
            }
        }
        self.absorb_meta(
            page.page,
            page.has_more,
            page.has_previous,
            page.total_count,
            page.total_pages,
        );
    }

    /// Records a failed fetch; previously loaded items stay in place.
    pub(crate) fn fail(&mut self, err: FetchError) {
        self.is_loading = false;
        self.error = Some(err);
    }

    pub(crate) fn cancel(&mut self) {
        self.is_loading = false;
    }

    fn absorb_meta(
        &mut self,
        page: u32,
        has_more: bool,
        has_previous: bool,
        total_count: Option<u64>,
        total_pages: Option<u32>,
    ) {
        self.page = page;
        self.has_more = has_more;
        self.has_previous = has_previous;
        self.total_count = total_count;
        self.total_pages = total_pages;
        self.is_loading = false;
        self.error = None;
    }
}
