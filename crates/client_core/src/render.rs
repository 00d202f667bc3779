//! Pure mapping from controller state to the display model a host UI draws.

use shared::domain::{Tag, TermId};

use crate::controller::SearchState;

pub const DEFINITION_PREVIEW_CHARS: usize = 150;
pub const TERMS_ERROR_MESSAGE: &str = "Error loading terms";
pub const TAGS_ERROR_MESSAGE: &str = "Error loading tags";
pub const NO_TERMS_MESSAGE: &str = "No terms found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    pub query: String,
    pub results: ResultsView,
    pub summary: Option<String>,
    pub pagination: Option<PaginationView>,
    pub terms_loading: bool,
    pub tags: Vec<TagRow>,
    pub tags_loading: bool,
    pub tags_error: Option<String>,
    /// Selected tags, in selection order, shown as removable chips.
    pub chips: Vec<String>,
}

impl SearchView {
    pub fn is_idle(&self) -> bool {
        !self.terms_loading && !self.tags_loading
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    /// Nothing has been loaded yet.
    Pending,
    Rows(Vec<TermRow>),
    Empty(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRow {
    pub id: TermId,
    pub term: String,
    pub definition_preview: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub label: String,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub name: String,
    /// `None` for a selected tag that is not in the loaded tag pages.
    pub count: Option<u64>,
    pub checked: bool,
}

/// Scroll position of the tag list container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn near_bottom(&self, threshold_px: f64) -> bool {
        self.scroll_height - self.scroll_top <= self.client_height + threshold_px
    }
}

pub fn render(state: &SearchState) -> SearchView {
    let terms = &state.terms;
    let results = if terms.error.is_some() {
        ResultsView::Error(TERMS_ERROR_MESSAGE.to_string())
    } else if !terms.is_loaded() {
        ResultsView::Pending
    } else if terms.items.is_empty() {
        ResultsView::Empty(NO_TERMS_MESSAGE.to_string())
    } else {
        ResultsView::Rows(
            terms
                .items
                .iter()
                .map(|term| TermRow {
                    id: term.id,
                    term: term.term.clone(),
                    definition_preview: preview(&term.definition),
                    tags: term.tags.clone(),
                })
                .collect(),
        )
    };

    let showing_rows = matches!(results, ResultsView::Rows(_));
    let summary = showing_rows.then(|| {
        format!(
            "Showing {} of {} terms",
            terms.items.len(),
            terms.total_count.unwrap_or(terms.items.len() as u64)
        )
    });
    let pagination = terms
        .total_pages
        .filter(|total| showing_rows && *total > 1)
        .map(|total_pages| PaginationView {
            current_page: terms.page,
            total_pages,
            label: format!("Page {} of {}", terms.page, total_pages),
            previous_enabled: terms.has_previous && !terms.is_loading,
            next_enabled: terms.has_more && !terms.is_loading,
        });

    SearchView {
        query: state.criteria.query_text().to_string(),
        results,
        summary,
        pagination,
        terms_loading: terms.is_loading,
        tags: tag_rows(state),
        tags_loading: state.tags.is_loading,
        tags_error: state
            .tags
            .error
            .as_ref()
            .map(|_| TAGS_ERROR_MESSAGE.to_string()),
        chips: state.criteria.selected_tags().map(str::to_string).collect(),
    }
}

/// Selected tags first in selection order, then the rest alphabetically.
fn tag_rows(state: &SearchState) -> Vec<TagRow> {
    let known = |name: &str| state.tags.items.iter().find(|tag| tag.name == name);

    let mut rows: Vec<TagRow> = state
        .criteria
        .selected_tags()
        .map(|name| TagRow {
            name: name.to_string(),
            count: known(name).map(|tag| tag.count),
            checked: true,
        })
        .collect();

    let mut unselected: Vec<&Tag> = state
        .tags
        .items
        .iter()
        .filter(|tag| !state.criteria.is_selected(&tag.name))
        .collect();
    unselected.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    rows.extend(unselected.into_iter().map(|tag| TagRow {
        name: tag.name.clone(),
        count: Some(tag.count),
        checked: false,
    }));
    rows
}

fn preview(definition: &str) -> String {
    match definition.char_indices().nth(DEFINITION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &definition[..cut]),
        None => definition.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{criteria::FilterCriteria, page::Page};
    use shared::domain::Term;

    fn term(id: i64, definition: &str) -> Term {
        Term {
            id: TermId(id),
            term: format!("term-{id}"),
            definition: definition.to_string(),
            tags: Vec::new(),
        }
    }

    fn loaded(items: Vec<Term>, page: u32, total_pages: u32) -> SearchState {
        let mut state = SearchState::default();
        state.terms.replace(Page {
            items,
            page,
            has_more: page < total_pages,
            has_previous: page > 1,
            total_count: Some(7),
            total_pages: Some(total_pages),
        });
        state
    }

    #[test]
    fn long_definitions_are_truncated() {
        let long = "x".repeat(200);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(150)));
        assert_eq!(preview(&"é".repeat(150)), "é".repeat(150));
    }

    #[test]
    fn single_page_hides_pagination_but_keeps_summary() {
        let view = render(&loaded(vec![term(1, "a")], 1, 1));
        assert!(view.pagination.is_none());
        assert_eq!(view.summary.as_deref(), Some("Showing 1 of 7 terms"));
    }

    #[test]
    fn middle_page_enables_both_controls_unless_loading() {
        let mut state = loaded(vec![term(1, "a")], 2, 3);
        let pagination = render(&state).pagination.expect("pagination");
        assert_eq!(pagination.label, "Page 2 of 3");
        assert!(pagination.previous_enabled && pagination.next_enabled);

        state.terms.begin();
        let pagination = render(&state).pagination.expect("pagination");
        assert!(!pagination.previous_enabled && !pagination.next_enabled);
    }

    #[test]
    fn empty_and_failed_results_replace_the_rows() {
        let view = render(&loaded(Vec::new(), 1, 1));
        assert_eq!(view.results, ResultsView::Empty(NO_TERMS_MESSAGE.into()));
        assert!(view.summary.is_none());

        let mut state = loaded(vec![term(1, "a")], 1, 2);
        state.terms.fail(crate::error::FetchError::network("down"));
        let view = render(&state);
        assert_eq!(view.results, ResultsView::Error(TERMS_ERROR_MESSAGE.into()));
        assert!(view.pagination.is_none());
    }

    #[test]
    fn selected_tags_lead_in_selection_order() {
        let mut state = SearchState::default();
        state.tags.replace(Page {
            items: vec![
                Tag { name: "physics".into(), count: 2 },
                Tag { name: "Botany".into(), count: 1 },
                Tag { name: "chemistry".into(), count: 3 },
                Tag { name: "biology".into(), count: 4 },
            ],
            page: 1,
            has_more: false,
            has_previous: false,
            total_count: None,
            total_pages: None,
        });
        state.criteria = FilterCriteria::default()
            .toggle_tag("physics")
            .toggle_tag("geology");

        let rows = render(&state).tags;
        let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["physics", "geology", "biology", "Botany", "chemistry"]);
        assert_eq!(rows[0].count, Some(2));
        assert_eq!(rows[1].count, None);
        assert!(rows[0].checked && rows[1].checked && !rows[2].checked);
    }

    #[test]
    fn scroll_within_threshold_is_near_bottom() {
        let metrics = ScrollMetrics {
            scroll_height: 1000.0,
            scroll_top: 550.0,
            client_height: 400.0,
        };
        assert!(metrics.near_bottom(100.0));
        assert!(!metrics.near_bottom(0.0));
    }
}
