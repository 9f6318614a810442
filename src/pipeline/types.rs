//! Core data types for the transfer pipeline

use crate::error::TransferError;
use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

/// Monitoring policy configured per token
///
/// Deserialized from the plain strings used in `config.yaml`. Anything other
/// than the two known modes is kept verbatim so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MonitorMode {
    ExchangeDeposit,
    WhaleTransfer,
    Unknown(String),
}

impl From<String> for MonitorMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "exchange_deposit" => MonitorMode::ExchangeDeposit,
            "whale_transfer" => MonitorMode::WhaleTransfer,
            _ => MonitorMode::Unknown(value),
        }
    }
}

impl From<MonitorMode> for String {
    fn from(mode: MonitorMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorMode::ExchangeDeposit => write!(f, "exchange_deposit"),
            MonitorMode::WhaleTransfer => write!(f, "whale_transfer"),
            MonitorMode::Unknown(other) => write!(f, "{}", other),
        }
    }
}

/// Transfer record as returned by the ledger reader, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransfer {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Token base units as a decimal string
    pub value: String,
    /// Unix seconds as a decimal string
    pub time_stamp: String,
}

impl RawTransfer {
    pub fn parse_timestamp(&self) -> Result<i64, TransferError> {
        self.time_stamp
            .trim()
            .parse::<i64>()
            .map_err(|_| TransferError::MalformedTimestamp(self.time_stamp.clone()))
    }

    pub fn parse_amount(&self) -> Result<U256, TransferError> {
        parse_raw_amount(&self.value)
    }
}

/// Parse an unsigned base-10 integer of up to 256 bits
pub fn parse_raw_amount(value: &str) -> Result<U256, TransferError> {
    let digits = value.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransferError::MalformedAmount(value.to_string()));
    }

    U256::from_str_radix(digits, 10).map_err(|_| TransferError::MalformedAmount(value.to_string()))
}

/// One validated on-chain token movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub raw_amount: U256,
    pub timestamp: i64,
}

impl Transfer {
    /// Token amount scaled by `decimals`, exact while it fits a `Decimal`
    ///
    /// Amounts whose integer part exceeds the 96-bit `Decimal` mantissa
    /// saturate to `Decimal::MAX` (logged).
    pub fn token_amount(&self, decimals: u8) -> Decimal {
        scale_amount(self.raw_amount, decimals).unwrap_or_else(|| {
            log::warn!(
                "Amount {} of {} (decimals {}) exceeds decimal range, saturating",
                self.raw_amount,
                self.tx_hash,
                decimals
            );
            Decimal::MAX
        })
    }

    /// USD value of the transfer at `price`, saturating on overflow
    pub fn usd_value(&self, decimals: u8, price: Decimal) -> Decimal {
        self.token_amount(decimals)
            .checked_mul(price)
            .unwrap_or_else(|| {
                log::warn!("USD value of {} overflows decimal range, saturating", self.tx_hash);
                Decimal::MAX
            })
    }
}

/// `raw / 10^decimals` as a `Decimal`
///
/// Fractional digits past what the mantissa can hold are truncated; `None`
/// only when the integer part alone does not fit.
fn scale_amount(raw: U256, decimals: u8) -> Option<Decimal> {
    let ten = U256::from(10u8);
    let mantissa_limit = U256::from(u128::MAX >> 32);

    let mut mantissa = raw;
    let mut scale = u32::from(decimals);
    while scale > MAX_DECIMAL_SCALE || (mantissa > mantissa_limit && scale > 0) {
        mantissa /= ten;
        scale -= 1;
    }
    if mantissa > mantissa_limit {
        return None;
    }

    let mut amount = Decimal::from_str(&mantissa.to_string()).ok()?;
    amount.set_scale(scale).ok()?;
    Some(amount)
}

/// Deduplication identity of a (chain, token, transaction) triple
pub fn processed_key(chain: &str, symbol: &str, tx_hash: &str) -> String {
    format!("{}:{}:{}", chain, symbol, tx_hash)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ExchangeDeposit,
    WhaleTransfer,
}

/// Why a transfer was evaluated but not announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BelowThreshold,
    NoRecipientLabel,
    NoDepositKeyword,
    NoExchangeMatch,
    InternalTransfer,
    UnknownMode,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::BelowThreshold => "below USD threshold",
            SkipReason::NoRecipientLabel => "recipient has no label",
            SkipReason::NoDepositKeyword => "recipient label has no deposit keyword",
            SkipReason::NoExchangeMatch => "recipient label matches no exchange",
            SkipReason::InternalTransfer => "internal exchange transfer",
            SkipReason::UnknownMode => "unknown monitor mode",
        };
        write!(f, "{}", text)
    }
}

/// Outcome of classifying one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub should_notify: bool,
    pub notification_type: Option<NotificationType>,
    pub matched_exchange: Option<String>,
    pub skip_reason: Option<SkipReason>,
}

impl ClassificationResult {
    pub fn notify(notification_type: NotificationType, matched_exchange: Option<String>) -> Self {
        Self {
            should_notify: true,
            notification_type: Some(notification_type),
            matched_exchange,
            skip_reason: None,
        }
    }

    pub fn skip(reason: SkipReason) -> Self {
        Self {
            should_notify: false,
            notification_type: None,
            matched_exchange: None,
            skip_reason: Some(reason),
        }
    }
}
