//! Cursor pagination as an explicit page stream.

use std::collections::HashSet;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::http::MetricsClient;
use super::models::RawPage;
use super::Endpoint;
use crate::error::{MetricsError, MetricsResult};

/// One page of results with the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Cursor for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

#[derive(Debug)]
enum Cursor {
    First,
    Next(String),
    Exhausted,
}

/// Lazy, finite, non-restartable sequence of pages for one endpoint.
///
/// Each call to [`PageStream::next_page`] issues at most one request. Once
/// the server stops returning a cursor, or any request fails, the stream is
/// exhausted and never requests again.
pub struct PageStream<'a, T> {
    client: &'a MetricsClient,
    endpoint: Endpoint,
    query: Vec<(String, String)>,
    cursor: Cursor,
    followed: HashSet<String>,
    pages_fetched: usize,
    _item: PhantomData<T>,
}

impl<'a, T> PageStream<'a, T>
where
    T: DeserializeOwned,
{
    pub(crate) fn new(
        client: &'a MetricsClient,
        endpoint: Endpoint,
        query: Vec<(String, String)>,
    ) -> Self {
        Self {
            client,
            endpoint,
            query,
            cursor: Cursor::First,
            followed: HashSet::new(),
            pages_fetched: 0,
            _item: PhantomData,
        }
    }

    /// Number of requests issued so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether no further request will be issued.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.cursor, Cursor::Exhausted)
    }

    /// Fetch the next page, or `None` once pagination is complete.
    ///
    /// # Errors
    ///
    /// Returns an API-class [`MetricsError`] if the request fails, the body
    /// cannot be decoded, or the server repeats a cursor already followed.
    pub async fn next_page(&mut self) -> MetricsResult<Option<Page<T>>> {
        let cursor = match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
            Cursor::Exhausted => return Ok(None),
            Cursor::First => None,
            Cursor::Next(cursor) => Some(cursor),
        };

        let mut query = self.query.clone();
        if let Some(cursor) = &cursor {
            query.push((self.endpoint.cursor_param().to_string(), cursor.clone()));
        }

        debug!(
            endpoint = self.endpoint.path(),
            cursor = cursor.as_deref().unwrap_or("-"),
            page = self.pages_fetched + 1,
            "Fetching page"
        );
        let raw: RawPage<T> = self.client.get_json(self.endpoint, &query).await?;
        self.pages_fetched += 1;

        let next_cursor = raw.cursor();
        if let Some(next) = &next_cursor {
            if !self.followed.insert(next.clone()) {
                return Err(MetricsError::RepeatedCursor {
                    endpoint: self.endpoint.path().to_string(),
                    cursor: next.clone(),
                });
            }
            self.cursor = Cursor::Next(next.clone());
        }

        Ok(Some(Page {
            data: raw.data,
            next_cursor,
        }))
    }

    /// Drain the stream, returning every page in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing page; no partial result is returned.
    pub async fn collect_pages(mut self) -> MetricsResult<Vec<Page<T>>> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        debug!(
            endpoint = self.endpoint.path(),
            pages = pages.len(),
            "Pagination complete"
        );
        Ok(pages)
    }
}
