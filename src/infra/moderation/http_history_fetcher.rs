use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::core::moderation::{sort_newest_first, CommentRecord, HistoryFetcher, ModerationError};

/// Reads a user's comment history from the comment data API.
pub struct HttpHistoryFetcher {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct HistoryResponse {
    data: HistoryData,
}

#[derive(Deserialize)]
struct HistoryData {
    #[serde(default)]
    rows: Vec<CommentRecord>,
}

fn unavailable(e: impl ToString) -> ModerationError {
    ModerationError::HistoryUnavailable(e.to_string())
}

impl HttpHistoryFetcher {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ModerationError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("CommentModeration/1.0"),
        );
        if let Some(token) = token {
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(unavailable)?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(unavailable)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HistoryFetcher for HttpHistoryFetcher {
    async fn fetch_history(&self, user_id: &str) -> Result<Vec<CommentRecord>, ModerationError> {
        let url = format!("{}/comments/history", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(unavailable)?;

        if !resp.status().is_success() {
            return Err(ModerationError::HistoryUnavailable(format!(
                "data API returned {} for comment history",
                resp.status()
            )));
        }

        let body: HistoryResponse = resp.json().await.map_err(unavailable)?;
        let mut rows = body.data.rows;
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}
