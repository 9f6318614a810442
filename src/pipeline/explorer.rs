//! Etherscan-compatible explorer integration
//!
//! Reads ERC-20/BEP-20 `Transfer` logs for one token contract over a recent
//! block window.
//!
//! ## API Reference
//!
//! - `?module=proxy&action=eth_blockNumber` → latest block (hex)
//! - `?module=logs&action=getLogs&address=..&fromBlock=..&toBlock=latest&topic0=..`
//!
//! Works against Etherscan, BscScan and any other explorer exposing the
//! same API shape.

use super::types::RawTransfer;
use crate::error::FetchError;
use alloy_primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Source of raw transfer records for a token contract
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch recent transfers of `contract` from `api_url`
    ///
    /// An explorer "no records" answer is `Ok(vec![])`, not an error.
    async fn fetch_transfers(
        &self,
        api_url: &str,
        api_key: &str,
        contract: &str,
    ) -> Result<Vec<RawTransfer>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerLog {
    pub transaction_hash: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub time_stamp: String,
}

/// HTTP client for Etherscan-style explorers
pub struct EtherscanClient {
    client: reqwest::Client,
    lookback_blocks: u64,
}

impl EtherscanClient {
    pub fn new(lookback_blocks: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            lookback_blocks,
        })
    }

    async fn latest_block(&self, api_url: &str, api_key: &str) -> Result<u64, FetchError> {
        let response: ProxyResponse = self
            .client
            .get(api_url)
            .query(&[("module", "proxy"), ("action", "eth_blockNumber"), ("apikey", api_key)])
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hex = response
            .result
            .as_str()
            .ok_or_else(|| FetchError::Decode(format!("unexpected block number: {}", response.result)))?;

        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| FetchError::Decode(format!("block number '{}': {}", hex, e)))
    }
}

#[async_trait]
impl LedgerReader for EtherscanClient {
    async fn fetch_transfers(
        &self,
        api_url: &str,
        api_key: &str,
        contract: &str,
    ) -> Result<Vec<RawTransfer>, FetchError> {
        let from_block = match self.latest_block(api_url, api_key).await {
            Ok(latest) => latest.saturating_sub(self.lookback_blocks),
            Err(e) => {
                log::error!("Failed to get block number: {}", e);
                0
            }
        };

        let from_block = from_block.to_string();
        let response: LogsResponse = self
            .client
            .get(api_url)
            .query(&[
                ("module", "logs"),
                ("action", "getLogs"),
                ("address", contract),
                ("fromBlock", from_block.as_str()),
                ("toBlock", "latest"),
                ("topic0", TRANSFER_TOPIC),
                ("apikey", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_logs_response(response)
    }
}

fn parse_logs_response(response: LogsResponse) -> Result<Vec<RawTransfer>, FetchError> {
    if response.status == "0" && response.message.contains("No records found") {
        return Ok(Vec::new());
    }

    if response.status != "1" {
        log::debug!("API response: {}", response.result);
        let message = if response.message.is_empty() {
            "Unknown error".to_string()
        } else {
            response.message
        };
        return Err(FetchError::Api(message));
    }

    let logs: Vec<ExplorerLog> = serde_json::from_value(response.result)
        .map_err(|e| FetchError::Decode(format!("logs: {}", e)))?;

    Ok(logs.iter().filter_map(decode_transfer_log).collect())
}

/// Turn a `Transfer` log into a raw record
///
/// Topics 1 and 2 are the zero-padded sender and recipient. Amount and
/// timestamp are hex; values that fail to decode are passed through as-is
/// so the caller can reject that single record.
pub fn decode_transfer_log(log: &ExplorerLog) -> Option<RawTransfer> {
    if log.topics.len() < 3 {
        return None;
    }

    Some(RawTransfer {
        hash: log.transaction_hash.clone(),
        from: topic_to_address(&log.topics[1]),
        to: topic_to_address(&log.topics[2]),
        value: hex_to_decimal(&log.data).unwrap_or_else(|| log.data.clone()),
        time_stamp: hex_to_decimal(&log.time_stamp).unwrap_or_else(|| log.time_stamp.clone()),
    })
}

fn topic_to_address(topic: &str) -> String {
    let tail_start = topic.len().saturating_sub(40);
    format!("0x{}", topic.get(tail_start..).unwrap_or_default().to_lowercase())
}

fn hex_to_decimal(hex: &str) -> Option<String> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return None;
    }
    U256::from_str_radix(digits, 16).ok().map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_log() -> serde_json::Value {
        json!({
            "address": "0xdac17f958d2ee523a2206206994597c13d831ec7",
            "topics": [
                TRANSFER_TOPIC,
                "0x000000000000000000000000AbC0000000000000000000000000000000000001",
                "0x00000000000000000000000028c6c06298d514db089934071355e5743bf21d60"
            ],
            "data": "0x00000000000000000000000000000000000000000000000014d1120d7b160000",
            "timeStamp": "0x6553f100",
            "transactionHash": "0x5c50"
        })
    }

    #[test]
    fn test_decode_transfer_log() {
        let log: ExplorerLog = serde_json::from_value(sample_log()).unwrap();
        let raw = decode_transfer_log(&log).unwrap();

        assert_eq!(raw.hash, "0x5c50");
        assert_eq!(raw.from, "0xabc0000000000000000000000000000000000001");
        assert_eq!(raw.to, "0x28c6c06298d514db089934071355e5743bf21d60");
        assert_eq!(raw.value, "1500000000000000000");
        assert_eq!(raw.time_stamp, "1700000000");
    }

    #[test]
    fn test_short_topic_list_dropped() {
        let mut value = sample_log();
        value["topics"] = json!([TRANSFER_TOPIC]);
        let log: ExplorerLog = serde_json::from_value(value).unwrap();
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn test_bad_hex_passed_through() {
        let mut value = sample_log();
        value["data"] = json!("0xZZ");
        let log: ExplorerLog = serde_json::from_value(value).unwrap();
        assert_eq!(decode_transfer_log(&log).unwrap().value, "0xZZ");
    }

    #[test]
    fn test_no_records_is_empty() {
        let response: LogsResponse = serde_json::from_value(json!({
            "status": "0",
            "message": "No records found",
            "result": []
        }))
        .unwrap();
        assert_eq!(parse_logs_response(response).unwrap(), Vec::new());
    }

    #[test]
    fn test_api_error_surfaces() {
        let response: LogsResponse = serde_json::from_value(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Invalid API Key"
        }))
        .unwrap();
        assert!(matches!(parse_logs_response(response), Err(FetchError::Api(m)) if m == "NOTOK"));
    }

    #[test]
    fn test_ok_response_parsed() {
        let response: LogsResponse = serde_json::from_value(json!({
            "status": "1",
            "message": "OK",
            "result": [sample_log(), sample_log()]
        }))
        .unwrap();
        assert_eq!(parse_logs_response(response).unwrap().len(), 2);
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API
    async fn test_fetch_live_transfers() {
        let api_key = std::env::var("ETHERSCAN_API_KEY").unwrap();
        let client = EtherscanClient::new(50).unwrap();
        let result = client
            .fetch_transfers(
                "https://api.etherscan.io/api",
                &api_key,
                "0xdac17f958d2ee523a2206206994597c13d831ec7",
            )
            .await;
        assert!(result.is_ok());
    }
}
