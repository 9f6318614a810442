//! Alert record and its chat-message rendering

use super::types::NotificationType;
use chrono::{TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Structured alert handed to a notifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub notification_type: NotificationType,
    pub chain_name: String,
    pub explorer_url: String,
    pub token_symbol: String,
    pub token_name: String,
    pub amount: Decimal,
    pub usd_value: Decimal,
    /// Threshold the alert was raised against
    pub usd_threshold: Decimal,
    pub from_address: String,
    pub from_label: Option<String>,
    pub to_address: String,
    pub to_label: Option<String>,
    pub matched_exchange: Option<String>,
    pub tx_hash: String,
    pub timestamp: i64,
}

/// `0x1234...abcd` style short address
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Format with thousands separators and a fixed number of decimals
pub fn format_thousands(value: Decimal, decimals: u32) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let formatted = format!("{:.*}", decimals as usize, rounded);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

impl Alert {
    pub fn formatted_time(&self) -> String {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| self.timestamp.to_string())
    }

    pub fn tx_link(&self) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), self.tx_hash)
    }

    fn sender_display(&self) -> String {
        with_label(&self.from_address, self.from_label.as_deref())
    }

    /// Plain-text message body
    pub fn render_text(&self) -> String {
        match self.notification_type {
            NotificationType::ExchangeDeposit => self.render_exchange_deposit(),
            NotificationType::WhaleTransfer => self.render_whale_transfer(),
        }
    }

    fn header_lines(&self) -> String {
        format!(
            "💎 Token: {} ({}) [{}]\n\
             💰 Amount: {} {}\n\
             💵 Value: ≈ ${} USD",
            self.token_symbol,
            self.token_name,
            self.chain_name,
            format_thousands(self.amount, 2),
            self.token_symbol,
            format_thousands(self.usd_value, 2),
        )
    }

    fn render_exchange_deposit(&self) -> String {
        let receiver = self
            .to_label
            .clone()
            .unwrap_or_else(|| short_address(&self.to_address));

        format!(
            "🚨 Exchange Deposit Alert\n\n\
             {}\n\
             📤 From: {}\n\
             🏦 To: {}\n\
             🔗 {}Scan: {}\n\
             ⏰ Time: {}",
            self.header_lines(),
            self.sender_display(),
            receiver,
            self.chain_name,
            self.tx_link(),
            self.formatted_time(),
        )
    }

    fn render_whale_transfer(&self) -> String {
        format!(
            "🐋 Whale Transfer Alert\n\n\
             {}\n\
             📤 From: {}\n\
             📥 To: {}\n\
             🔗 {}Scan: {}\n\
             ⏰ Time: {}\n\n\
             ⚠️ Whale mode: every transfer of ${} or more is broadcast",
            self.header_lines(),
            self.sender_display(),
            with_label(&self.to_address, self.to_label.as_deref()),
            self.chain_name,
            self.tx_link(),
            self.formatted_time(),
            format_thousands(self.usd_threshold, 0),
        )
    }
}

fn with_label(address: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{} ({})", short_address(address), label),
        None => short_address(address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn alert(notification_type: NotificationType) -> Alert {
        Alert {
            notification_type,
            chain_name: "Ethereum".to_string(),
            explorer_url: "https://etherscan.io/".to_string(),
            token_symbol: "USDT".to_string(),
            token_name: "Tether USD".to_string(),
            amount: dec("1234567.891"),
            usd_value: dec("1234320.5"),
            usd_threshold: Decimal::from(100_000),
            from_address: "0x1111111111111111111111111111111111112222".to_string(),
            from_label: None,
            to_address: "0x3333333333333333333333333333333333334444".to_string(),
            to_label: Some("Binance Deposit 14".to_string()),
            matched_exchange: Some("Binance".to_string()),
            tx_hash: "0xfeed".to_string(),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(Decimal::ZERO, 2), "0.00");
        assert_eq!(format_thousands(dec("999.994"), 2), "999.99");
        assert_eq!(format_thousands(dec("999.995"), 2), "1,000.00");
        assert_eq!(format_thousands(dec("1000"), 2), "1,000.00");
        assert_eq!(format_thousands(dec("1234567.891"), 2), "1,234,567.89");
        assert_eq!(format_thousands(dec("100000.4"), 0), "100,000");
        assert_eq!(format_thousands(dec("-2500.5"), 1), "-2,500.5");
        assert_eq!(format_thousands(dec("-0.001"), 2), "0.00");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("0x1111111111111111111111111111111111112222"), "0x1111...2222");
        assert_eq!(short_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_formatted_time_is_utc() {
        assert_eq!(alert(NotificationType::WhaleTransfer).formatted_time(), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_exchange_deposit_message() {
        let text = alert(NotificationType::ExchangeDeposit).render_text();

        assert!(text.starts_with("🚨 Exchange Deposit Alert"));
        assert!(text.contains("USDT (Tether USD) [Ethereum]"));
        assert!(text.contains("1,234,567.89 USDT"));
        assert!(text.contains("≈ $1,234,320.50 USD"));
        assert!(text.contains("From: 0x1111...2222\n"));
        assert!(text.contains("To: Binance Deposit 14"));
        assert!(text.contains("EthereumScan: https://etherscan.io/tx/0xfeed"));
    }

    #[test]
    fn test_whale_message_shows_both_labels() {
        let mut alert = alert(NotificationType::WhaleTransfer);
        alert.from_label = Some("Jump Trading".to_string());
        let text = alert.render_text();

        assert!(text.starts_with("🐋 Whale Transfer Alert"));
        assert!(text.contains("From: 0x1111...2222 (Jump Trading)"));
        assert!(text.contains("To: 0x3333...4444 (Binance Deposit 14)"));
        assert!(text.ends_with("⚠️ Whale mode: every transfer of $100,000 or more is broadcast"));
    }

    #[test]
    fn test_deposit_message_has_no_whale_footer() {
        let text = alert(NotificationType::ExchangeDeposit).render_text();
        assert!(!text.contains("Whale mode"));
        assert!(text.ends_with("UTC"));
    }
}
