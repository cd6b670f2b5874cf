//! Where the rate page comes from.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

/// Something that can hand back the current source document.
///
/// Calls block; async callers run them on a blocking thread.
pub trait RateSource: Send + Sync {
    fn fetch_document(&self) -> Result<String, AppError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> &str;
}

/// The published page, fetched over HTTPS.
pub struct HttpRateSource {
    client: Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("selic-mora/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl RateSource for HttpRateSource {
    fn fetch_document(&self) -> Result<String, AppError> {
        let resp = self.client.get(&self.url).send().map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamUnavailable(format!("Tempo esgotado ao consultar a fonte da Selic: {e}"))
            } else {
                AppError::UpstreamUnavailable(format!("Falha ao consultar a fonte da Selic: {e}"))
            }
        })?;

        if !resp.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Fonte da Selic respondeu com status {}.",
                resp.status()
            )));
        }

        let body = resp.text().map_err(|e| {
            AppError::UpstreamUnavailable(format!("Falha ao ler a resposta da fonte da Selic: {e}"))
        })?;
        info!(url = %self.url, bytes = body.len(), "fetched rate page");
        Ok(body)
    }

    fn describe(&self) -> &str {
        &self.url
    }
}
