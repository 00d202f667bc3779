//! Incremental term search: filter criteria, paged remote collections,
//! debounced input and generation-checked responses reconciled into one
//! renderable state.

pub mod arbiter;
pub mod config;
pub mod controller;
pub mod criteria;
pub mod debouncer;
pub mod error;
pub mod fetcher;
pub mod page;
pub mod render;
pub mod selection;

pub use arbiter::{Generation, RequestArbiter};
pub use config::ClientSettings;
pub use controller::{SearchController, SearchOptions, SearchState};
pub use criteria::FilterCriteria;
pub use debouncer::Debouncer;
pub use error::{FetchError, FetchErrorKind, SelectionError};
pub use fetcher::{HttpTagFetcher, HttpTermFetcher, PagedCollectionFetcher};
pub use page::{Page, PageState};
pub use render::{render, PaginationView, ResultsView, ScrollMetrics, SearchView, TagRow, TermRow};
pub use selection::TermAnnotation;
