use serde::{Deserialize, Serialize};

use crate::domain::{Tag, Term};

/// One page of the term collection (`GET {base}?page=..&q=..&tags[]=..`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermListResponse {
    pub results: Vec<Term>,
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
}

/// One page of the tag collection (`GET {base}tags/?page=..`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPageResponse {
    pub tags: Vec<Tag>,
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}
