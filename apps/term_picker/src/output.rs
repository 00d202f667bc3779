use client_core::{ResultsView, SearchView};

pub fn format_view(view: &SearchView) -> String {
    let mut out = Vec::new();
    out.push(format!("search: {:?}", view.query));
    if !view.chips.is_empty() {
        out.push(format!("filters: {}", view.chips.join(", ")));
    }

    match &view.results {
        ResultsView::Pending => out.push("  loading terms...".to_string()),
        ResultsView::Empty(message) | ResultsView::Error(message) => {
            out.push(format!("  {message}"))
        }
        ResultsView::Rows(rows) => {
            for row in rows {
                let tags = if row.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", row.tags.join(", "))
                };
                out.push(format!(
                    "  {:>4}  {} - {}{tags}",
                    row.id, row.term, row.definition_preview
                ));
            }
        }
    }
    if let Some(summary) = &view.summary {
        out.push(format!("  {summary}"));
    }
    if let Some(pagination) = &view.pagination {
        out.push(format!(
            "  {}{}{}",
            if pagination.previous_enabled { "< prev  " } else { "" },
            pagination.label,
            if pagination.next_enabled { "  next >" } else { "" },
        ));
    }

    out.push("tags:".to_string());
    for tag in &view.tags {
        let count = tag.count.map(|count| format!(" ({count})")).unwrap_or_default();
        out.push(format!(
            "  [{}] {}{count}",
            if tag.checked { 'x' } else { ' ' },
            tag.name
        ));
    }
    if let Some(error) = &view.tags_error {
        out.push(format!("  {error}"));
    }
    if view.tags_loading {
        out.push("  loading tags...".to_string());
    }
    out.join("\n")
}
