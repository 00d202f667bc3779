use std::{net::SocketAddr, path::Path};

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalog_api::{
    get_term, list_tags, list_terms, load_catalog, seed_catalog, CatalogContext, TermQuery,
};
use serde::Deserialize;
use shared::{
    domain::{Term, TermId},
    error::{ApiError, ErrorCode},
    protocol::{TagPageResponse, TermListResponse},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Debug, Deserialize)]
struct TagQuery {
    page: Option<String>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let entries = match &settings.catalog_path {
        Some(path) => load_catalog(Path::new(path))?,
        None => {
            info!("no catalog_path configured; serving the built-in seed catalog");
            seed_catalog()
        }
    };
    let ctx = CatalogContext::new(entries, settings.page_size, settings.tag_page_size);
    let app = build_router(ctx);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, page_size = settings.page_size, "catalog server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(ctx: CatalogContext) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/terms/", get(http_list_terms))
        .route("/terms/tags/", get(http_list_tags))
        .route("/terms/:term_id/", get(http_get_term))
        .with_state(ctx)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_terms(
    State(ctx): State<CatalogContext>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<TermListResponse> {
    let query = TermQuery::from_pairs(&pairs);
    list_terms(&ctx, &query).map(Json).map_err(into_response)
}

async fn http_list_tags(
    State(ctx): State<CatalogContext>,
    Query(query): Query<TagQuery>,
) -> ApiResult<TagPageResponse> {
    list_tags(&ctx, query.page.as_deref())
        .map(Json)
        .map_err(into_response)
}

async fn http_get_term(
    State(ctx): State<CatalogContext>,
    UrlPath(raw_id): UrlPath<String>,
) -> ApiResult<Term> {
    let term_id: TermId = raw_id.parse().map_err(|_| {
        into_response(ApiError::new(
            ErrorCode::Validation,
            format!("invalid term id: {raw_id}"),
        ))
    })?;
    get_term(&ctx, term_id).map(Json).map_err(into_response)
}

fn into_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
