use crate::error::{AppError, Result};
use crate::sources::CandleSource;
use crate::types::Timeframe;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const HYPERLIQUID_INFO_URL: &str = "https://api.hyperliquid.xyz/info";

/// Body of an info-endpoint `candleSnapshot` request.
#[derive(Debug, Serialize)]
struct InfoRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    req: SnapshotRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRequest<'a> {
    coin: &'a str,
    interval: &'static str,
    start_time: i64,
    end_time: i64,
}

/// Hyperliquid info API client.
///
/// Every request carries the client timeout, so a dead endpoint resolves
/// to an error instead of hanging an evaluation.
#[derive(Clone)]
pub struct HyperliquidClient {
    client: Client,
    info_url: String,
}

impl HyperliquidClient {
    /// Fails if the HTTP client cannot be built; there is no fallback
    /// client without the timeout.
    pub fn new(info_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Wraith/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            info_url: info_url.into(),
        })
    }

    pub fn info_url(&self) -> &str {
        &self.info_url
    }
}

impl CandleSource for HyperliquidClient {
    async fn candle_snapshot(
        &self,
        coin: &str,
        interval: Timeframe,
        start_time: i64,
        end_time: i64,
    ) -> Result<serde_json::Value> {
        let body = InfoRequest {
            kind: "candleSnapshot",
            req: SnapshotRequest {
                coin,
                interval: interval.as_str(),
                start_time,
                end_time,
            },
        };

        let response = self.client.post(&self.info_url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            warn!(coin, interval = %interval, "Hyperliquid API returned {}: {}", status, snippet);
            return Err(AppError::ExternalApi(format!(
                "Hyperliquid API error: {}",
                status
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        debug!(coin, interval = %interval, "Hyperliquid candleSnapshot received");
        Ok(payload)
    }
}
