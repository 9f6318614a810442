//! CoinGecko price integration
//!
//! Endpoint: `{api_url}/simple/price?ids={id}&vs_currencies=usd`
//! Returns: `{ "<id>": { "usd": <price> } }`

use crate::error::FetchError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Source of USD quotes for price asset ids
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD price for `asset_id`, `Ok(None)` if the service has no quote
    async fn fetch_price(&self, asset_id: &str) -> Result<Option<Decimal>, FetchError>;
}

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoClient {
    client: reqwest::Client,
    api_url: String,
}

impl CoinGeckoClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoClient {
    async fn fetch_price(&self, asset_id: &str) -> Result<Option<Decimal>, FetchError> {
        let url = format!("{}/simple/price", self.api_url);

        let response = self
            .client
            .get(&url)
            .query(&[("ids", asset_id), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Api(format!("CoinGecko API error: {}", response.status())));
        }

        let prices: SimplePriceResponse = response.json().await?;
        Ok(extract_usd_price(&prices, asset_id))
    }
}

fn extract_usd_price(prices: &SimplePriceResponse, asset_id: &str) -> Option<Decimal> {
    let Some(price) = prices.get(asset_id).and_then(|quotes| quotes.get("usd")).copied() else {
        log::error!("Price not found for {}", asset_id);
        return None;
    };

    // Shortest round-trip rendering, so a quote of 2.41 becomes exactly 2.41
    match Decimal::from_str(&price.to_string()) {
        Ok(price) => Some(price),
        Err(e) => {
            log::error!("Unusable price {} for {}: {}", price, asset_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_usd_price() {
        let prices: SimplePriceResponse =
            serde_json::from_str(r#"{"pancakeswap-token": {"usd": 2.41}}"#).unwrap();

        assert_eq!(extract_usd_price(&prices, "pancakeswap-token"), Some(Decimal::new(241, 2)));
        assert_eq!(extract_usd_price(&prices, "tether"), None);
    }

    #[test]
    fn test_small_quote_is_exact() {
        let prices: SimplePriceResponse = serde_json::from_str(r#"{"shiba-inu": {"usd": 0.00001234}}"#).unwrap();
        assert_eq!(extract_usd_price(&prices, "shiba-inu"), Some(Decimal::new(1234, 8)));
    }

    #[test]
    fn test_empty_response_has_no_price() {
        let prices: SimplePriceResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_usd_price(&prices, "tether"), None);
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API
    async fn test_fetch_live_price() {
        let client = CoinGeckoClient::new("https://api.coingecko.com/api/v3").unwrap();
        let price = client.fetch_price("tether").await.unwrap();
        assert!(price.is_some());
    }
}
