use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{Tag, Term},
    error::ApiError,
    protocol::{TagPageResponse, TermListResponse},
};
use url::Url;

use crate::{criteria::FilterCriteria, error::FetchError, page::Page};

/// Fetches one page of a remote collection.
///
/// Implementations report every failure as a [`FetchError`]; nothing is
/// allowed to escape the fetch as a panic.
#[async_trait]
pub trait PagedCollectionFetcher<T>: Send + Sync {
    async fn fetch_page(&self, criteria: &FilterCriteria, page: u32)
        -> Result<Page<T>, FetchError>;
}

/// Parses `raw` and makes sure the path ends with `/` so relative
/// endpoints such as `tags/` resolve below it.
pub fn normalize_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Term collection: `GET {base}?page=..&q=..&tags[]=..`, page-numbered.
#[derive(Debug, Clone)]
pub struct HttpTermFetcher {
    http: Client,
    base_url: Url,
}

impl HttpTermFetcher {
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn request_url(&self, criteria: &FilterCriteria, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(criteria.query_pairs(page));
        url
    }
}

#[async_trait]
impl PagedCollectionFetcher<Term> for HttpTermFetcher {
    async fn fetch_page(
        &self,
        criteria: &FilterCriteria,
        page: u32,
    ) -> Result<Page<Term>, FetchError> {
        let body: TermListResponse = get_json(&self.http, self.request_url(criteria, page)).await?;
        Ok(Page {
            has_more: body.next.is_some(),
            has_previous: body.previous.is_some(),
            page: body.current_page,
            total_count: Some(body.count),
            total_pages: Some(body.total_pages),
            items: body.results,
        })
    }
}

/// Tag collection in page-numbered append mode: `GET {base}tags/?page=..`.
///
/// The tag listing is not narrowed by the criteria.
#[derive(Debug, Clone)]
pub struct HttpTagFetcher {
    http: Client,
    tags_url: Url,
}

impl HttpTagFetcher {
    pub fn new(http: Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            tags_url: base_url.join("tags/")?,
        })
    }

    pub fn request_url(&self, page: u32) -> Url {
        let mut url = self.tags_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }
}

#[async_trait]
impl PagedCollectionFetcher<Tag> for HttpTagFetcher {
    async fn fetch_page(
        &self,
        _criteria: &FilterCriteria,
        page: u32,
    ) -> Result<Page<Tag>, FetchError> {
        let body: TagPageResponse = get_json(&self.http, self.request_url(page)).await?;
        Ok(Page {
            items: body.tags,
            page,
            has_more: body.has_more,
            has_previous: page > 1,
            total_count: None,
            total_pages: None,
        })
    }
}

async fn get_json<R: DeserializeOwned>(http: &Client, url: Url) -> Result<R, FetchError> {
    tracing::debug!(%url, "GET");
    let response = http.get(url).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiError>(&body)
            .map(|err| err.message)
            .unwrap_or_else(|_| status.to_string());
        return Err(FetchError::server(status.as_u16(), message));
    }

    serde_json::from_slice(&body).map_err(|err| FetchError::decode(err.to_string()))
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
