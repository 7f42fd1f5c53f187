//! Shared HTTP session for one run
//!
//! A single connection pool is built per run and handed to every upstream
//! client by reference. Each client keeps its own handle to the pool, so the
//! connections are released once the session and every client built from it
//! have been dropped.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::config::Config;

/// Response bodies longer than this are cut in trace output.
const MAX_TRACE_BODY: usize = 4096;

/// Query parameters that carry credentials.
const SECRET_PARAMS: &[&str] = &["apikey", "api_key", "X-Plex-Token"];

/// Connection pool shared by all upstream clients during a run.
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(config.http_timeout)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reclaimarr/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        debug!(timeout_secs = timeout.as_secs(), "HTTP session opened");
        Ok(Self { client })
    }

    /// Handle to the pooled client for an upstream wrapper to keep.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Drop the session's own handle to the pool.
    ///
    /// Clients built from the session keep working until they are dropped
    /// themselves; the pool closes with the last handle.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        debug!("HTTP session closed");
    }
}

/// Read a JSON body, tracing the full exchange and failing on non-2xx.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &str,
    operation: &str,
    response: Response,
) -> Result<T> {
    let status = response.status();
    let url = redact_url(response.url());
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read {service} {operation} response"))?;

    trace!(
        service = %service,
        operation = %operation,
        url = %url,
        status = status.as_u16(),
        body = %truncate_for_trace(&body),
        "Upstream response"
    );

    if !status.is_success() {
        anyhow::bail!("{service} {operation} failed with status: {status}");
    }

    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse {service} {operation} response"))
}

/// Copy of `url` with credential query parameters masked.
pub(crate) fn redact_url(url: &Url) -> Url {
    let mut redacted = url.clone();
    if url.query().is_none() {
        return redacted;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.iter().any(|secret| *secret == k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

fn truncate_for_trace(body: &str) -> &str {
    if body.len() <= MAX_TRACE_BODY {
        return body;
    }
    let mut end = MAX_TRACE_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
