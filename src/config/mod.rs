use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::feed::{MissingHashPolicy, DEFAULT_BUFFER_CAP};
use crate::models::TradeFilter;
use crate::polymarket::data_client::DATA_API_BASE;
use crate::polymarket::gamma_client::GAMMA_API_BASE;
use crate::services::feed_poller::FeedSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Upstream hosts (also the targets of the pass-through proxy)
    pub data_api_url: String,
    pub gamma_api_url: String,
    pub http_timeout_secs: Option<u64>,

    // Trade feed
    pub poll_interval_secs: u64,
    pub trade_page_limit: u32,
    pub buffer_cap: usize,
    pub missing_hash: MissingHashPolicy,
    pub default_filter: TradeFilter,

    /// Bearer token for `/api/*` and `/ws`. Unset disables auth.
    pub api_token: Option<String>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            data_api_url: DATA_API_BASE.into(),
            gamma_api_url: GAMMA_API_BASE.into(),
            http_timeout_secs: None,
            poll_interval_secs: 5,
            trade_page_limit: 500,
            buffer_cap: DEFAULT_BUFFER_CAP,
            missing_hash: MissingHashPolicy::Keep,
            default_filter: TradeFilter::all(),
            api_token: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let default_filter_raw = env::var("DEFAULT_FILTER").unwrap_or_else(|_| "all".into());
        let default_filter = TradeFilter::from_preset(&default_filter_raw).ok_or_else(|| {
            anyhow::anyhow!("DEFAULT_FILTER: unknown preset {default_filter_raw:?}")
        })?;

        let missing_hash = match env::var("DEDUP_MISSING_HASH") {
            Ok(raw) => raw
                .parse::<MissingHashPolicy>()
                .map_err(|e| anyhow::anyhow!("DEDUP_MISSING_HASH: {e}"))?,
            Err(_) => defaults.missing_hash,
        };

        let poll_interval_secs: u64 = env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| defaults.poll_interval_secs.to_string())
            .parse()?;
        if poll_interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be at least 1");
        }

        let buffer_cap: usize = env::var("BUFFER_CAP")
            .unwrap_or_else(|_| defaults.buffer_cap.to_string())
            .parse()?;
        if buffer_cap == 0 {
            anyhow::bail!("BUFFER_CAP must be at least 1");
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,

            data_api_url: env::var("DATA_API_URL").unwrap_or(defaults.data_api_url),
            gamma_api_url: env::var("GAMMA_API_URL").unwrap_or(defaults.gamma_api_url),
            http_timeout_secs: parse_optional(
                "HTTP_TIMEOUT_SECS",
                env::var("HTTP_TIMEOUT_SECS").ok(),
            )?,

            poll_interval_secs,
            trade_page_limit: env::var("TRADE_PAGE_LIMIT")
                .unwrap_or_else(|_| defaults.trade_page_limit.to_string())
                .parse()?,
            buffer_cap,
            missing_hash,
            default_filter,

            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            page_limit: self.trade_page_limit,
            buffer_cap: self.buffer_cap,
            missing_hash: self.missing_hash,
        }
    }

    /// Shared reqwest client for upstream calls and the proxy.
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }
}

/// Unset or blank means `None`; anything else must parse.
fn parse_optional<T>(name: &str, raw: Option<String>) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{name}: invalid value {value:?}: {e}")),
    }
}
