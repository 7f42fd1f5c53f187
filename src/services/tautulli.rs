//! Tautulli v2 API client for playback history
//!
//! Every call goes through `/api/v2` with a `cmd` parameter and returns the
//! same envelope: `{"response": {"result": "success", "message": .., "data": ..}}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::app_mode::SectionType;
use crate::config::ServiceEndpoint;
use crate::models::{LibrarySection, PlaybackEvent};
use crate::services::http_client::{HttpSession, read_json};

const SERVICE: &str = "tautulli";

/// Events requested in the single history page. Large enough to cover the
/// lookback window without paging.
pub const HISTORY_PAGE_LENGTH: u32 = 10_000;

/// Section discovery and history queries of a playback-history service.
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn list_sections(&self) -> Result<Vec<LibrarySection>>;

    /// Playback events in `section` after `after_epoch`, most recent first.
    async fn query_history(
        &self,
        section: &LibrarySection,
        after_epoch: i64,
    ) -> Result<Vec<PlaybackEvent>>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    result: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl Envelope {
    /// Check the result flag, then decode `data`. Error envelopes often carry
    /// `"data": {}`, so the payload is only typed once the flag says success.
    fn into_data<T: DeserializeOwned>(self, cmd: &str) -> Result<T> {
        let body = self.response;
        if body.result != "success" {
            anyhow::bail!(
                "tautulli {cmd} returned '{}': {}",
                body.result,
                body.message.unwrap_or_else(|| "no message".to_string())
            );
        }
        let data = body
            .data
            .with_context(|| format!("tautulli {cmd} response has no data"))?;
        serde_json::from_value(data).with_context(|| format!("Failed to decode tautulli {cmd} data"))
    }
}

#[derive(Debug, Default, Deserialize)]
struct HistoryPage {
    #[serde(default)]
    data: Vec<HistoryRow>,
}

/// One row of `get_history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRow {
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<i64>,
}

impl HistoryRow {
    /// Shows are grouped by series name, movies by their own title.
    pub fn into_event(self, section_type: SectionType) -> PlaybackEvent {
        let subject = match section_type {
            SectionType::Show => self.grandparent_title,
            _ => self.title,
        };
        PlaybackEvent {
            subject_title: subject.unwrap_or_default(),
            viewed_at: self.date.unwrap_or_default(),
        }
    }
}

/// Tautulli client
pub struct TautulliClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TautulliClient {
    pub fn new(session: &HttpSession, endpoint: &ServiceEndpoint) -> Self {
        Self {
            client: session.client(),
            base_url: endpoint.url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    async fn command<T: DeserializeOwned>(&self, cmd: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/api/v2", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str()), ("cmd", cmd)])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to call tautulli {cmd}"))?;

        let envelope: Envelope = read_json(SERVICE, cmd, response).await?;
        envelope.into_data(cmd)
    }
}

#[async_trait]
impl HistoryService for TautulliClient {
    async fn list_sections(&self) -> Result<Vec<LibrarySection>> {
        let sections: Vec<LibrarySection> = self.command("get_libraries", &[]).await?;
        debug!(service = SERVICE, count = sections.len(), "Library sections returned");
        Ok(sections)
    }

    async fn query_history(
        &self,
        section: &LibrarySection,
        after_epoch: i64,
    ) -> Result<Vec<PlaybackEvent>> {
        let params = [
            ("section_id", section.section_id.to_string()),
            ("length", HISTORY_PAGE_LENGTH.to_string()),
            ("order_column", "date".to_string()),
            ("order_dir", "desc".to_string()),
            ("after", after_epoch.to_string()),
        ];
        let page: HistoryPage = self.command("get_history", &params).await?;

        debug!(
            service = SERVICE,
            section_id = section.section_id,
            rows = page.data.len(),
            "History rows returned"
        );

        Ok(page
            .data
            .into_iter()
            .map(|row| row.into_event(section.section_type))
            .collect())
    }
}
