//! Backend API client
//!
//! [`ApiClient`] wraps a `reqwest` client with the backend base URL and
//! bearer token, and centralizes status triage: `401` becomes an
//! authentication error, any other non-2xx response surfaces its body
//! text as an API error.

pub mod assist;
pub mod auth;
pub mod conversations;
pub mod documents;
pub mod models;

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TextlyError};

/// HTTP client bound to one backend
///
/// Cloning is cheap; the underlying connection pool is shared.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use textly::api::ApiClient;
///
/// let client = ApiClient::new(
///     "http://localhost:8080",
///     Some("token".to_string()),
///     Duration::from_secs(30),
/// )
/// .unwrap();
/// assert!(client.endpoint("/conversations/").ends_with("/conversations/"));
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: url::Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the given backend
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend base URL (e.g. `http://localhost:8080`)
    /// * `token` - Optional bearer token attached to every request
    /// * `connect_timeout` - TCP connect timeout; no total request
    ///   timeout is set because chat responses stream for a long time
    pub fn new(base_url: &str, token: Option<String>, connect_timeout: Duration) -> Result<Self> {
        let base_url = url::Url::parse(base_url)
            .map_err(|e| TextlyError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Builds a full endpoint URL from a path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let request = self
            .authorize(self.http.get(self.endpoint(path)))
            .query(query);
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.authorize(self.http.post(self.endpoint(path))).json(body);
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST a JSON body, only checking the status
    pub async fn post_ok<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let request = self.authorize(self.http.post(self.endpoint(path))).json(body);
        check_status(request.send().await?).await?;
        Ok(())
    }

    /// POST a JSON body and return the raw response for streaming
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let request = self
            .authorize(self.http.post(self.endpoint(path)))
            .header("Accept", "text/event-stream")
            .json(body);
        check_status(request.send().await?).await
    }

    /// GET an SSE stream and return the raw response
    pub async fn get_stream(&self, path: &str) -> Result<reqwest::Response> {
        let request = self
            .authorize(self.http.get(self.endpoint(path)))
            .header("Accept", "text/event-stream");
        check_status(request.send().await?).await
    }

    /// PATCH a JSON body and decode a JSON response
    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self
            .authorize(self.http.patch(self.endpoint(path)))
            .json(body);
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// DELETE a resource, only checking the status
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.authorize(self.http.delete(self.endpoint(path)));
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// Maps response statuses to the client's error categories
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            "authentication required".to_string()
        } else {
            body
        };
        return Err(TextlyError::Authentication(message).into());
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TextlyError::Api(format!("HTTP {}: {}", status, body)).into());
    }

    Ok(response)
}

/// Parses a backend record timestamp
///
/// Accepts RFC 3339 as well as the record store's space-separated UTC
/// format (`2024-05-01 12:00:00.000Z`). Unparseable values fall back to
/// the current time with a warning, matching the lenient date handling
/// of the record consumers.
///
/// # Examples
///
/// ```
/// use textly::api::parse_record_timestamp;
///
/// let ts = parse_record_timestamp("2024-05-01 12:00:00.000Z");
/// assert_eq!(ts.timestamp(), 1_714_564_800);
/// ```
pub fn parse_record_timestamp(value: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) =
        NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S%.f")
    {
        return DateTime::from_naive_utc_and_offset(naive, Utc);
    }
    tracing::warn!("Unparseable record timestamp '{}', using now", value);
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = ApiClient::new("not a url", None, Duration::from_secs(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client =
            ApiClient::new("http://localhost:8080/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("/conversations/start"),
            "http://localhost:8080/conversations/start"
        );
    }

    #[test]
    fn test_parse_record_timestamp_rfc3339() {
        let ts = parse_record_timestamp("2024-05-01T12:00:00Z");
        assert_eq!(ts.timestamp(), 1_714_564_800);
    }

    #[test]
    fn test_parse_record_timestamp_record_store_format() {
        let ts = parse_record_timestamp("2024-05-01 12:00:00.000Z");
        assert_eq!(ts.timestamp(), 1_714_564_800);
    }

    #[test]
    fn test_parse_record_timestamp_garbage_falls_back() {
        let before = Utc::now();
        let ts = parse_record_timestamp("yesterday-ish");
        assert!(ts >= before);
    }
}
