use indexmap::IndexSet;
use url::form_urlencoded;

/// Query text plus the selected tag set.
///
/// Equality ignores the order in which tags were selected; the selection
/// order is only kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    query_text: String,
    selected_tags: IndexSet<String>,
}

impl FilterCriteria {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            selected_tags: IndexSet::new(),
        }
    }

    pub fn with_query(&self, text: impl Into<String>) -> Self {
        Self {
            query_text: text.into(),
            selected_tags: self.selected_tags.clone(),
        }
    }

    /// Adds `name` when absent, removes it when present.
    pub fn toggle_tag(&self, name: &str) -> Self {
        let mut selected_tags = self.selected_tags.clone();
        if !selected_tags.shift_remove(name) {
            selected_tags.insert(name.to_string());
        }
        Self {
            query_text: self.query_text.clone(),
            selected_tags,
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected_tags.contains(name)
    }

    /// Selected tags in the order they were selected.
    pub fn selected_tags(&self) -> impl Iterator<Item = &str> {
        self.selected_tags.iter().map(String::as_str)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_tags.len()
    }

    /// Request parameters for `page`: `page`, then `q` unless empty, then one
    /// `tags[]` per selected tag in sorted order.
    pub fn query_pairs(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", page.to_string())];
        if !self.query_text.is_empty() {
            pairs.push(("q", self.query_text.clone()));
        }
        let mut tags: Vec<&String> = self.selected_tags.iter().collect();
        tags.sort();
        pairs.extend(tags.into_iter().map(|tag| ("tags[]", tag.clone())));
        pairs
    }

    pub fn to_query_string(&self, page: u32) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs(page))
            .finish()
    }
}
