//! Cursor-paginated chat history.
//!
//! Pages are fetched newest-first through the [`RemoteCallClient`]; the id of
//! the oldest record of a full page is the cursor for the next, older page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::remote::{RemoteCallClient, RemoteFailure, RemoteRequest};

pub const DEFAULT_PAGE_SIZE: u16 = 50;
/// Discord refuses more than 100 messages per request.
pub const MAX_PAGE_SIZE: u16 = 100;

/// Author of a history record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordAuthor {
    pub id: String,
    pub username: String,
}

/// One message of a channel history.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistoryRecord {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<RecordAuthor>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One page of records, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Stateless history page fetcher.
#[derive(Clone)]
pub struct CursorPager {
    client: RemoteCallClient,
    api_base: String,
    token: String,
}

impl CursorPager {
    pub fn new(client: RemoteCallClient, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn page_url(&self, source_id: u64, cursor: Option<&str>, limit: u16) -> Result<String, RemoteFailure> {
        let mut url = Url::parse(&format!("{}/channels/{}/messages", self.api_base, source_id))
            .map_err(|e| RemoteFailure::RequestSetup(format!("Invalid history URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(before) = cursor {
                query.append_pair("before", before);
            }
        }
        Ok(url.into())
    }

    /// Fetch records strictly older than `cursor`, or the newest ones without it.
    ///
    /// `page_size` defaults to 50 and is clamped to 1..=100. The returned page
    /// carries a cursor only when it was full.
    pub async fn fetch_page(
        &self,
        source_id: u64,
        cursor: Option<&str>,
        page_size: Option<u16>,
    ) -> Result<HistoryPage, RemoteFailure> {
        let limit = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let request = RemoteRequest::get(self.page_url(source_id, cursor, limit)?)
            .header("Authorization", format!("Bot {}", self.token));

        let records: Vec<HistoryRecord> = self.client.call_json(&request).await?;
        let next_cursor = if records.len() >= limit as usize {
            records.last().map(|record| record.id.clone())
        } else {
            None
        };

        Ok(HistoryPage { records, next_cursor })
    }

    /// Walk backwards through the whole history of `source_id`.
    ///
    /// Panel clients chain `nextCursor` themselves; this drives the same chain in-process.
    #[cfg(test)]
    pub(crate) fn walk(&self, source_id: u64, page_size: Option<u16>) -> HistoryWalk<'_> {
        HistoryWalk {
            pager: self,
            source_id,
            page_size,
            cursor: None,
            exhausted: false,
        }
    }
}

/// Lazy page sequence produced by `CursorPager::walk`.
#[cfg(test)]
pub(crate) struct HistoryWalk<'a> {
    pager: &'a CursorPager,
    source_id: u64,
    page_size: Option<u16>,
    cursor: Option<String>,
    exhausted: bool,
}

#[cfg(test)]
impl HistoryWalk<'_> {
    /// Next older page, or `None` once the history is exhausted.
    pub(crate) async fn next_page(&mut self) -> Result<Option<HistoryPage>, RemoteFailure> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .pager
            .fetch_page(self.source_id, self.cursor.as_deref(), self.page_size)
            .await?;
        self.cursor = page.next_cursor.clone();
        self.exhausted = self.cursor.is_none();

        if page.records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RetryPolicy;
    use mockito::Matcher;
    use std::collections::HashSet;

    fn record(id: u64) -> serde_json::Value {
        serde_json::json!({
            "id": id.to_string(),
            "content": format!("message {}", id),
            "author": { "id": "1", "username": "someone" },
            "timestamp": format!("2025-01-01T00:00:{:02}+00:00", id),
        })
    }

    fn body(ids: &[u64]) -> String {
        serde_json::Value::Array(ids.iter().map(|&id| record(id)).collect()).to_string()
    }

    fn pager(server: &mockito::Server) -> CursorPager {
        let client = RemoteCallClient::new(reqwest::Client::new(), RetryPolicy::default());
        CursorPager::new(client, server.url(), "token")
    }

    #[tokio::test]
    async fn test_walk_is_gap_free_and_descending() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/channels/9/messages")
            .match_query(Matcher::Exact("limit=2".into()))
            .match_header("authorization", "Bot token")
            .with_body(body(&[5, 4]))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/channels/9/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "2".into()),
                Matcher::UrlEncoded("before".into(), "4".into()),
            ]))
            .with_body(body(&[3, 2]))
            .create_async()
            .await;
        let third = server
            .mock("GET", "/channels/9/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "2".into()),
                Matcher::UrlEncoded("before".into(), "2".into()),
            ]))
            .with_body(body(&[1]))
            .create_async()
            .await;

        let pager = pager(&server);
        let mut walk = pager.walk(9, Some(2));
        let mut records = Vec::new();
        while let Some(page) = walk.next_page().await.unwrap() {
            records.extend(page.records);
        }

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "4", "3", "2", "1"]);

        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        for pair in records.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
        }

        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_short_page_has_no_cursor() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/channels/3/messages")
            .match_query(Matcher::Any)
            .with_body(body(&[8, 7]))
            .create_async()
            .await;

        let page = pager(&server).fetch_page(3, None, None).await.unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_empty_page_ends_walk() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/channels/3/messages")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;

        let pager = pager(&server);
        let page = pager.fetch_page(3, Some("100"), Some(500)).await.unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.next_cursor, None);

        let mut walk = pager.walk(3, None);
        assert!(walk.next_page().await.unwrap().is_none());
        assert!(walk.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_page_size_is_clamped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channels/3/messages")
            .match_query(Matcher::Exact("limit=100".into()))
            .with_body("[]")
            .create_async()
            .await;

        pager(&server).fetch_page(3, None, Some(1000)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_propagated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channels/3/messages")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message":"Missing Access"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = pager(&server).fetch_page(3, None, None).await.unwrap_err();

        assert!(matches!(err, RemoteFailure::HttpStatus { code: 403, .. }));
        mock.assert_async().await;
    }
}
