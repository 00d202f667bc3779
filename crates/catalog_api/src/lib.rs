use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Tag, Term, TermId},
    error::ApiError,
    protocol::{TagPageResponse, TermListResponse},
};
use url::form_urlencoded;

/// A stored glossary entry. Only `live` entries are visible through the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: TermId,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_live")]
    pub live: bool,
}

fn default_live() -> bool {
    true
}

impl CatalogEntry {
    fn to_term(&self) -> Term {
        Term {
            id: self.id,
            term: self.term.clone(),
            definition: self.definition.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CatalogContext {
    entries: Arc<Vec<CatalogEntry>>,
    page_size: usize,
    tag_page_size: usize,
}

impl CatalogContext {
    pub fn new(entries: Vec<CatalogEntry>, page_size: usize, tag_page_size: usize) -> Self {
        Self {
            entries: Arc::new(entries),
            page_size: page_size.max(1),
            tag_page_size: tag_page_size.max(1),
        }
    }

    fn live_entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|entry| entry.live)
    }
}

/// Parsed query string of the term list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermQuery {
    pub page: Option<String>,
    pub q: Option<String>,
    pub tags: Vec<String>,
}

impl TermQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => query.page = Some(value.clone()),
                "q" => query.q = Some(value.clone()),
                "tags[]" | "tags" => query.tags.push(value.clone()),
                _ => {}
            }
        }
        query
    }

    fn link_for_page(&self, page: usize) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("page", &page.to_string());
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            serializer.append_pair("q", q);
        }
        for tag in &self.tags {
            serializer.append_pair("tags[]", tag);
        }
        format!("?{}", serializer.finish())
    }
}

pub fn list_terms(ctx: &CatalogContext, query: &TermQuery) -> Result<TermListResponse, ApiError> {
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let matching: Vec<&CatalogEntry> = ctx
        .live_entries()
        .filter(|entry| match &needle {
            Some(needle) => entry.term.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .filter(|entry| {
            query
                .tags
                .iter()
                .all(|wanted| entry.tags.iter().any(|tag| tag == wanted))
        })
        .collect();

    let count = matching.len();
    // An empty result set still has one (empty) page.
    let total_pages = count.div_ceil(ctx.page_size).max(1);
    let page = resolve_page(query.page.as_deref(), total_pages)?;

    let start = (page - 1) * ctx.page_size;
    let results = matching
        .iter()
        .skip(start)
        .take(ctx.page_size)
        .map(|entry| entry.to_term())
        .collect();

    Ok(TermListResponse {
        results,
        count: count as u64,
        next: (page < total_pages).then(|| query.link_for_page(page + 1)),
        previous: (page > 1).then(|| query.link_for_page(page - 1)),
        current_page: page as u32,
        total_pages: total_pages as u32,
    })
}

pub fn get_term(ctx: &CatalogContext, id: TermId) -> Result<Term, ApiError> {
    ctx.live_entries()
        .find(|entry| entry.id == id)
        .map(CatalogEntry::to_term)
        .ok_or_else(|| ApiError::not_found(format!("term {id} not found")))
}

/// Tags of live entries with their counts, ordered by name.
pub fn list_tags(ctx: &CatalogContext, page: Option<&str>) -> Result<TagPageResponse, ApiError> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for entry in ctx.live_entries() {
        for tag in &entry.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let total_pages = counts.len().div_ceil(ctx.tag_page_size).max(1);
    let page = resolve_page(page, total_pages)?;
    let start = (page - 1) * ctx.tag_page_size;

    let tags = counts
        .into_iter()
        .skip(start)
        .take(ctx.tag_page_size)
        .map(|(name, count)| Tag {
            name: name.to_string(),
            count,
        })
        .collect();

    Ok(TagPageResponse {
        tags,
        has_more: page < total_pages,
    })
}

fn resolve_page(raw: Option<&str>, total_pages: usize) -> Result<usize, ApiError> {
    let page = match raw.map(str::trim) {
        None | Some("") => 1,
        Some("last") => total_pages,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::not_found("Invalid page."))?,
    };
    if page == 0 || page > total_pages {
        return Err(ApiError::not_found("Invalid page."));
    }
    Ok(page)
}

pub fn load_catalog(path: &Path) -> anyhow::Result<Vec<CatalogEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse catalog '{}'", path.display()))?;
    tracing::info!(path = %path.display(), entries = entries.len(), "loaded catalog");
    Ok(entries)
}

/// Small built-in glossary used when no catalog file is configured.
pub fn seed_catalog() -> Vec<CatalogEntry> {
    let rows: [(&str, &str, &[&str], bool); 8] = [
        ("cell", "The smallest structural unit of an organism.", &["biology"], true),
        ("cell wall", "A rigid layer outside the cell membrane of plants.", &["biology", "botany"], true),
        ("enzyme", "A protein that catalyses a biochemical reaction.", &["biology", "chemistry"], true),
        ("catalyst", "A substance that speeds up a reaction without being consumed.", &["chemistry"], true),
        ("isotope", "Atoms of an element with differing numbers of neutrons.", &["chemistry", "physics"], true),
        ("photon", "A quantum of electromagnetic radiation.", &["physics"], true),
        ("chloroplast", "An organelle where photosynthesis takes place.", &["biology", "botany"], true),
        ("draft entry", "Not yet published.", &["biology"], false),
    ];

    rows.iter()
        .enumerate()
        .map(|(idx, (term, definition, tags, live))| CatalogEntry {
            id: TermId(idx as i64 + 1),
            term: term.to_string(),
            definition: definition.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            live: *live,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CatalogContext {
        CatalogContext::new(seed_catalog(), 3, 2)
    }

    fn query(page: Option<&str>, q: Option<&str>, tags: &[&str]) -> TermQuery {
        TermQuery {
            page: page.map(str::to_string),
            q: q.map(str::to_string),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[test]
    fn search_is_case_insensitive_and_filters_by_all_tags() {
        let response = list_terms(&ctx(), &query(None, Some("CELL"), &["biology", "botany"]))
            .expect("terms");
        assert_eq!(response.count, 1);
        assert_eq!(response.results[0].term, "cell wall");
        assert_eq!(response.total_pages, 1);
        assert!(response.next.is_none());
        assert!(response.previous.is_none());
    }

    #[test]
    fn drafts_are_hidden() {
        let response = list_terms(&ctx(), &query(None, Some("draft"), &[])).expect("terms");
        assert_eq!(response.count, 0);
        assert!(response.results.is_empty());
        assert_eq!(response.total_pages, 1);
        assert!(get_term(&ctx(), TermId(8)).is_err());
    }

    #[test]
    fn pages_carry_links_that_keep_the_filter() {
        let response =
            list_terms(&ctx(), &query(Some("2"), None, &["biology"])).expect("terms");
        assert_eq!(response.count, 4);
        assert_eq!(response.current_page, 2);
        assert_eq!(response.total_pages, 2);
        assert_eq!(response.results.len(), 1);
        assert_eq!(
            response.previous.as_deref(),
            Some("?page=1&tags%5B%5D=biology")
        );
        assert!(response.next.is_none());
    }

    #[test]
    fn out_of_range_page_is_not_found() {
        let err = list_terms(&ctx(), &query(Some("9"), None, &[])).expect_err("invalid page");
        assert!(matches!(err.code, shared::error::ErrorCode::NotFound));
        let err = list_terms(&ctx(), &query(Some("abc"), None, &[])).expect_err("invalid page");
        assert_eq!(err.message, "Invalid page.");
    }

    #[test]
    fn tags_are_counted_over_live_entries_and_paged() {
        let first = list_tags(&ctx(), None).expect("tags");
        assert_eq!(
            first.tags,
            vec![
                Tag { name: "biology".into(), count: 4 },
                Tag { name: "botany".into(), count: 2 },
            ]
        );
        assert!(first.has_more);

        let last = list_tags(&ctx(), Some("2")).expect("tags");
        assert_eq!(last.tags[0].name, "chemistry");
        assert_eq!(last.tags[1].name, "physics");
        assert!(!last.has_more);
    }

    #[test]
    fn repeated_tag_pairs_are_collected() {
        let parsed = TermQuery::from_pairs(&[
            ("page".into(), "1".into()),
            ("q".into(), "cell".into()),
            ("tags[]".into(), "biology".into()),
            ("tags[]".into(), "botany".into()),
        ]);
        assert_eq!(parsed, query(Some("1"), Some("cell"), &["biology", "botany"]));
    }
}
