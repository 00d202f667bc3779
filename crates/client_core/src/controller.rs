//! Search session controller: owns the criteria and both collections'
//! page state for one picker session.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use shared::domain::{Tag, Term, TermId};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    arbiter::{Generation, RequestArbiter},
    config::ClientSettings,
    criteria::FilterCriteria,
    debouncer::{Debouncer, DEFAULT_DEBOUNCE},
    error::{FetchError, SelectionError},
    fetcher::{
        build_http_client, normalize_base_url, HttpTagFetcher, HttpTermFetcher,
        PagedCollectionFetcher,
    },
    page::{Page, PageState},
    render::{render, ScrollMetrics, SearchView},
    selection::TermAnnotation,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub scroll_threshold_px: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            scroll_threshold_px: 100.0,
        }
    }
}

impl From<&ClientSettings> for SearchOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            debounce: settings.debounce,
            scroll_threshold_px: settings.scroll_threshold_px,
        }
    }
}

/// Everything the renderer needs. Mutated only by [`SearchController`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub criteria: FilterCriteria,
    pub terms: PageState<Term>,
    pub tags: PageState<Tag>,
    pub closed: bool,
    /// Criteria and page of the most recently issued term fetch.
    pub last_term_request: Option<(FilterCriteria, u32)>,
    /// Criteria the currently loaded term page answers.
    pub loaded_term_criteria: Option<FilterCriteria>,
}

impl SearchState {
    /// No fetch in flight and no typed query still waiting to be searched.
    pub fn is_settled(&self) -> bool {
        !self.terms.is_loading
            && !self.tags.is_loading
            && self
                .last_term_request
                .as_ref()
                .is_some_and(|(issued, _)| *issued == self.criteria)
    }
}

struct ControllerInner {
    state: SearchState,
    term_task: Option<JoinHandle<()>>,
    tag_task: Option<JoinHandle<()>>,
}

pub struct SearchController {
    term_fetcher: Arc<dyn PagedCollectionFetcher<Term>>,
    tag_fetcher: Arc<dyn PagedCollectionFetcher<Tag>>,
    term_arbiter: RequestArbiter,
    tag_arbiter: RequestArbiter,
    debouncer: Debouncer<String>,
    scroll_threshold_px: f64,
    inner: Mutex<ControllerInner>,
    views: broadcast::Sender<SearchView>,
}

impl SearchController {
    /// Must be called from within a tokio runtime; the debounce timer task
    /// is spawned here.
    pub fn new(
        term_fetcher: Arc<dyn PagedCollectionFetcher<Term>>,
        tag_fetcher: Arc<dyn PagedCollectionFetcher<Tag>>,
        options: SearchOptions,
    ) -> Arc<Self> {
        let (views, _) = broadcast::channel(256);
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let debouncer = Debouncer::spawn(options.debounce, move |query: String| {
                if let Some(controller) = weak.upgrade() {
                    tokio::spawn(async move { controller.fire_debounced_query(query).await });
                }
            });
            Self {
                term_fetcher,
                tag_fetcher,
                term_arbiter: RequestArbiter::new(),
                tag_arbiter: RequestArbiter::new(),
                debouncer,
                scroll_threshold_px: options.scroll_threshold_px,
                inner: Mutex::new(ControllerInner {
                    state: SearchState::default(),
                    term_task: None,
                    tag_task: None,
                }),
                views,
            }
        })
    }

    /// Builds a controller backed by the HTTP collections under
    /// `settings.base_url`.
    pub fn from_settings(settings: &ClientSettings) -> Result<Arc<Self>, FetchError> {
        let base_url = normalize_base_url(&settings.base_url)
            .map_err(|err| FetchError::network(format!("invalid base url: {err}")))?;
        let http = build_http_client(settings.request_timeout)?;
        let tag_fetcher = HttpTagFetcher::new(http.clone(), &base_url)
            .map_err(|err| FetchError::network(format!("invalid tags url: {err}")))?;
        let term_fetcher = HttpTermFetcher::new(http, base_url);
        Ok(Self::new(
            Arc::new(term_fetcher),
            Arc::new(tag_fetcher),
            SearchOptions::from(settings),
        ))
    }

    pub fn subscribe_views(&self) -> broadcast::Receiver<SearchView> {
        self.views.subscribe()
    }

    pub async fn snapshot(&self) -> SearchState {
        self.inner.lock().await.state.clone()
    }

    pub async fn view(&self) -> SearchView {
        render(&self.inner.lock().await.state)
    }

    /// Starts the session: seeds the query (typically the editor's current
    /// selection) and loads the first page of both collections right away.
    pub async fn open(self: &Arc<Self>, initial_query: Option<&str>) {
        let mut inner = self.inner.lock().await;
        if inner.state.closed {
            return;
        }
        if let Some(query) = initial_query {
            inner.state.criteria = inner.state.criteria.with_query(query);
        }
        info!(query = inner.state.criteria.query_text(), "search session opened");
        let criteria = inner.state.criteria.clone();
        self.issue_term_fetch(&mut inner, criteria, 1);
        self.issue_tag_fetch(&mut inner, 1);
        self.publish(&inner.state);
    }

    pub async fn set_query(self: &Arc<Self>, text: &str) {
        let mut inner = self.inner.lock().await;
        if inner.state.closed {
            return;
        }
        inner.state.criteria = inner.state.criteria.with_query(text);
        self.debouncer.push(text.to_string());
        self.publish(&inner.state);
    }

    /// Selection is a discrete click, so both collections refresh at once
    /// and the term list goes back to page 1.
    pub async fn toggle_tag(self: &Arc<Self>, name: &str) {
        let mut inner = self.inner.lock().await;
        if inner.state.closed {
            return;
        }
        inner.state.criteria = inner.state.criteria.toggle_tag(name);
        debug!(
            tag = name,
            selected = inner.state.criteria.is_selected(name),
            "tag toggled"
        );
        let criteria = inner.state.criteria.clone();
        self.issue_term_fetch(&mut inner, criteria, 1);
        self.issue_tag_fetch(&mut inner, 1);
        self.publish(&inner.state);
    }

    /// Pages through the search the server last answered; a query still
    /// waiting on the debounce timer is not sent. Returns whether a fetch
    /// was issued.
    pub async fn request_next_term_page(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        let terms = &inner.state.terms;
        if inner.state.closed || terms.is_loading || !terms.has_more {
            return false;
        }
        let next = terms.page + 1;
        let committed = Self::committed_criteria(&inner.state);
        self.issue_term_fetch(&mut inner, committed, next);
        self.publish(&inner.state);
        true
    }

    /// Returns whether a fetch was issued.
    pub async fn request_prev_term_page(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        let terms = &inner.state.terms;
        if inner.state.closed || terms.is_loading || !terms.has_previous || terms.page <= 1 {
            return false;
        }
        let previous = terms.page - 1;
        let committed = Self::committed_criteria(&inner.state);
        self.issue_term_fetch(&mut inner, committed, previous);
        self.publish(&inner.state);
        true
    }

    /// Returns whether a fetch was issued.
    pub async fn request_more_tags(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.closed || !inner.state.tags.can_load_more() {
            return false;
        }
        let next = inner.state.tags.page + 1;
        self.issue_tag_fetch(&mut inner, next);
        self.publish(&inner.state);
        true
    }

    /// Scroll handler for the tag list: loads the next page near the bottom.
    pub async fn on_tag_scroll(self: &Arc<Self>, metrics: ScrollMetrics) -> bool {
        if !metrics.near_bottom(self.scroll_threshold_px) {
            return false;
        }
        self.request_more_tags().await
    }

    /// Resolves a clicked row id against the current results.
    ///
    /// Failures are logged and leave the state untouched.
    pub async fn select_term(
        &self,
        raw_id: &str,
        selected_text: &str,
    ) -> Result<TermAnnotation, SelectionError> {
        let id: TermId = raw_id.parse().map_err(|_| {
            warn!(raw_id, "ignoring selection with unparseable term id");
            SelectionError::InvalidInput(raw_id.to_string())
        })?;

        let inner = self.inner.lock().await;
        if inner.state.closed {
            return Err(SelectionError::Closed);
        }
        let term = inner
            .state
            .terms
            .items
            .iter()
            .find(|term| term.id == id)
            .cloned()
            .ok_or_else(|| {
                warn!(%id, "selected term is no longer in the result list");
                SelectionError::NotFound { id }
            })?;
        info!(%id, term = %term.term, "term selected");
        Ok(TermAnnotation::new(term, selected_text))
    }

    /// Ends the session. Pending debounce timers are released, in-flight
    /// fetches are aborted and any response that still arrives is dropped.
    /// The closed state is published once; nothing is published after.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state.closed {
            return;
        }
        inner.state.closed = true;
        self.term_arbiter.close();
        self.tag_arbiter.close();
        self.debouncer.cancel();
        if let Some(task) = inner.term_task.take() {
            task.abort();
        }
        if let Some(task) = inner.tag_task.take() {
            task.abort();
        }
        inner.state.terms.cancel();
        inner.state.tags.cancel();
        self.publish(&inner.state);
        info!("search session closed");
    }

    async fn fire_debounced_query(self: Arc<Self>, query: String) {
        let mut inner = self.inner.lock().await;
        if inner.state.closed {
            return;
        }
        let criteria = &inner.state.criteria;
        let already_requested = inner.state.terms.error.is_none()
            && inner
                .state
                .last_term_request
                .as_ref()
                .is_some_and(|(issued, page)| *page == 1 && issued == criteria);
        if already_requested {
            debug!(%query, "debounced query matches the last request; skipping");
            return;
        }
        let criteria = inner.state.criteria.clone();
        self.issue_term_fetch(&mut inner, criteria, 1);
        self.publish(&inner.state);
    }

    /// Criteria the loaded term page was requested with. Typed text still
    /// waiting on the debounce timer is not part of it.
    fn committed_criteria(state: &SearchState) -> FilterCriteria {
        state
            .loaded_term_criteria
            .clone()
            .unwrap_or_else(|| state.criteria.clone())
    }

    fn issue_term_fetch(
        self: &Arc<Self>,
        inner: &mut ControllerInner,
        criteria: FilterCriteria,
        page: u32,
    ) {
        let generation = self.term_arbiter.begin();
        inner.state.terms.begin();
        inner.state.last_term_request = Some((criteria.clone(), page));
        debug!(
            generation = generation.get(),
            page,
            query = criteria.query_text(),
            tags = criteria.selected_count(),
            "issuing term fetch"
        );

        let controller = Arc::clone(self);
        inner.term_task = Some(tokio::spawn(async move {
            let result = controller.term_fetcher.fetch_page(&criteria, page).await;
            controller.finish_term_fetch(generation, criteria, result).await;
        }));
    }

    fn issue_tag_fetch(self: &Arc<Self>, inner: &mut ControllerInner, page: u32) {
        let generation = self.tag_arbiter.begin();
        let criteria = inner.state.criteria.clone();
        inner.state.tags.begin();
        debug!(generation = generation.get(), page, "issuing tag fetch");

        let controller = Arc::clone(self);
        inner.tag_task = Some(tokio::spawn(async move {
            let result = controller.tag_fetcher.fetch_page(&criteria, page).await;
            controller.finish_tag_fetch(generation, result).await;
        }));
    }

    async fn finish_term_fetch(
        &self,
        generation: Generation,
        criteria: FilterCriteria,
        result: Result<Page<Term>, FetchError>,
    ) {
        let mut inner = self.inner.lock().await;
        if !self.term_arbiter.is_current(generation) {
            debug!(generation = generation.get(), "discarding stale term response");
            return;
        }
        match result {
            Ok(page) => {
                debug!(
                    generation = generation.get(),
                    page = page.page,
                    items = page.items.len(),
                    "term page applied"
                );
                inner.state.terms.replace(page);
                inner.state.loaded_term_criteria = Some(criteria);
            }
            Err(error) => {
                warn!(generation = generation.get(), %error, "term fetch failed");
                inner.state.terms.fail(error);
            }
        }
        self.publish(&inner.state);
    }

    async fn finish_tag_fetch(
        &self,
        generation: Generation,
        result: Result<Page<Tag>, FetchError>,
    ) {
        let mut inner = self.inner.lock().await;
        if !self.tag_arbiter.is_current(generation) {
            debug!(generation = generation.get(), "discarding stale tag response");
            return;
        }
        match result {
            Ok(page) if page.page <= 1 => inner.state.tags.replace(page),
            Ok(page) => inner
                .state
                .tags
                .append_unique(page, |tag: &Tag| tag.name.clone()),
            Err(error) => {
                warn!(generation = generation.get(), %error, "tag fetch failed");
                inner.state.tags.fail(error);
            }
        }
        self.publish(&inner.state);
    }

    fn publish(&self, state: &SearchState) {
        // No subscribers is fine: the host may only poll `view()`.
        let _ = self.views.send(render(state));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
