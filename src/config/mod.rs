//! Application configuration management

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;

use crate::app_mode::LibraryMode;

const DEFAULT_ITEM_COUNT: usize = 100;
const DEFAULT_MAX_CONCURRENT: usize = 16;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection details for one upstream service.
#[derive(Clone)]
pub struct ServiceEndpoint {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEndpoint")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Library manager settings for one mode
#[derive(Debug, Clone)]
pub struct LibraryManagerConfig {
    pub endpoint: ServiceEndpoint,

    /// How many items to rank when no limit is given on the command line
    pub default_limit: usize,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Sonarr (series mode)
    pub sonarr: Option<LibraryManagerConfig>,

    /// Radarr (movies mode)
    pub radarr: Option<LibraryManagerConfig>,

    /// Tautulli history service
    pub tautulli: ServiceEndpoint,

    /// Tautulli section name preferred for series mode
    pub tv_library_name: String,

    /// Tautulli section name preferred for movies mode
    pub movie_library_name: String,

    /// Directory reports are written to
    pub report_path: PathBuf,

    /// Ceiling on in-flight upstream requests per fan-out
    pub max_concurrent_requests: usize,

    /// Per-request timeout
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tautulli = ServiceEndpoint {
            url: parse_url("TAUTULLI_URL", lookup("TAUTULLI_URL"))?
                .context("TAUTULLI_URL is required")?,
            api_key: lookup("TAUTULLI_API_KEY").context("TAUTULLI_API_KEY is required")?,
        };

        Ok(Self {
            sonarr: library_manager(&lookup, "SONARR", "SONARR_SHOW_COUNT")?,
            radarr: library_manager(&lookup, "RADARR", "RADARR_MOVIE_COUNT")?,
            tautulli,

            tv_library_name: lookup("TAUTULLI_TV_LIBRARY_NAME")
                .unwrap_or_else(|| "TV Shows".to_string()),

            movie_library_name: lookup("TAUTULLI_MOVIE_LIBRARY_NAME")
                .unwrap_or_else(|| "Films".to_string()),

            report_path: lookup("REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./report")),

            max_concurrent_requests: lookup("MAX_CONCURRENT_REQUESTS")
                .map(|v| v.parse::<usize>().context("Invalid MAX_CONCURRENT_REQUESTS"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_CONCURRENT)
                .max(1),

            http_timeout: Duration::from_secs(
                lookup("HTTP_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>().context("Invalid HTTP_TIMEOUT_SECS"))
                    .transpose()?
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }

    /// Library manager settings for a mode; errors if that manager is not configured.
    pub fn library_manager(&self, mode: LibraryMode) -> Result<&LibraryManagerConfig> {
        let configured = match mode {
            LibraryMode::Series => self.sonarr.as_ref(),
            LibraryMode::Movies => self.radarr.as_ref(),
        };
        match configured {
            Some(cfg) => Ok(cfg),
            None => {
                let prefix = mode.service_name().to_ascii_uppercase();
                bail!("{prefix}_URL and {prefix}_API_KEY are required for {mode} mode")
            }
        }
    }

    /// Tautulli section name preferred for a mode.
    pub fn library_name(&self, mode: LibraryMode) -> &str {
        match mode {
            LibraryMode::Series => &self.tv_library_name,
            LibraryMode::Movies => &self.movie_library_name,
        }
    }
}

fn library_manager<F>(lookup: &F, prefix: &str, count_key: &str) -> Result<Option<LibraryManagerConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let url_key = format!("{prefix}_URL");
    let Some(url) = parse_url(&url_key, lookup(&url_key))? else {
        return Ok(None);
    };
    let key_key = format!("{prefix}_API_KEY");
    let api_key = lookup(&key_key).with_context(|| format!("{key_key} is required when {url_key} is set"))?;

    let default_limit = lookup(count_key)
        .map(|v| v.parse::<usize>().with_context(|| format!("Invalid {count_key}")))
        .transpose()?
        .unwrap_or(DEFAULT_ITEM_COUNT);

    Ok(Some(LibraryManagerConfig {
        endpoint: ServiceEndpoint { url, api_key },
        default_limit,
    }))
}

/// Validate a base URL and strip trailing slashes so paths can be appended.
fn parse_url(key: &str, value: Option<String>) -> Result<Option<String>> {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let trimmed = raw.trim().trim_end_matches('/').to_string();
    Url::parse(&trimmed).with_context(|| format!("Invalid {key}: {raw}"))?;
    Ok(Some(trimmed))
}
