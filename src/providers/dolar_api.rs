use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyRateProvider, RateQuote};

/// Quote source for the informal ("blue") USD rate published by DolarApi.
pub struct DolarApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl DolarApiProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("tripsplit/1.0")
            .build()?;
        Ok(DolarApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DolarResponse {
    compra: Decimal,
    venta: Decimal,
    #[serde(alias = "fechaActualizacion")]
    fecha_actualizacion: DateTime<Utc>,
}

#[async_trait]
impl CurrencyRateProvider for DolarApiProvider {
    #[instrument(name = "DolarApiFetch", skip(self), fields(base_url = %self.base_url))]
    async fn fetch_quote(&self) -> Result<RateQuote> {
        let url = format!("{}/v1/dolares/blue", self.base_url);
        debug!("Requesting exchange rate from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for URL: {}", response.status(), url));
        }

        let text = response.text().await?;
        let data: DolarResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", url, e))?;
        debug!(buy = %data.compra, sell = %data.venta, "Received DolarApi quote");

        Ok(RateQuote {
            buy: data.compra,
            sell: data.venta,
            as_of: data.fecha_actualizacion,
        })
    }
}
