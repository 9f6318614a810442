//! Transfer classification against the configured monitor policy
//!
//! Pure decision logic, no I/O. Mirrors the shape of a threshold signal
//! detector: value gate first, then mode-specific rules.
//!
//! # Rules
//! - Every mode: `usd_value < usd_threshold` never notifies (equality does).
//! - **whale_transfer**: notifies unconditionally once over the threshold.
//! - **exchange_deposit**: the recipient label must contain a deposit keyword
//!   and an exchange name, and the sender label must not contain any
//!   exchange name (internal exchange movements are suppressed).

use super::types::{ClassificationResult, MonitorMode, NotificationType, SkipReason, Transfer};
use rust_decimal::Decimal;

/// Policy knobs shared by all tokens
#[derive(Debug, Clone, Default)]
pub struct ClassifierPolicy {
    pub usd_threshold: Decimal,
    pub exchange_names: Vec<String>,
    pub deposit_keywords: Vec<String>,
}

impl ClassifierPolicy {
    pub fn new(usd_threshold: Decimal, exchange_names: Vec<String>, deposit_keywords: Vec<String>) -> Self {
        Self {
            usd_threshold,
            exchange_names,
            deposit_keywords,
        }
    }

    /// First exchange name (in configured order) contained in `label`
    fn match_exchange(&self, label_lower: &str) -> Option<&str> {
        self.exchange_names
            .iter()
            .find(|name| label_lower.contains(&name.to_lowercase()))
            .map(String::as_str)
    }

    fn has_deposit_keyword(&self, label_lower: &str) -> bool {
        self.deposit_keywords
            .iter()
            .any(|keyword| label_lower.contains(&keyword.to_lowercase()))
    }
}

/// Decide whether `transfer` should be announced
///
/// `usd_value` is the already-scaled value (`raw / 10^decimals * price`).
/// The transfer itself is not inspected by the current rules; it is passed
/// so callers keep a single call shape if rules start looking at it.
pub fn classify(
    _transfer: &Transfer,
    usd_value: Decimal,
    to_label: Option<&str>,
    from_label: Option<&str>,
    mode: &MonitorMode,
    policy: &ClassifierPolicy,
) -> ClassificationResult {
    if usd_value < policy.usd_threshold {
        return ClassificationResult::skip(SkipReason::BelowThreshold);
    }

    match mode {
        MonitorMode::WhaleTransfer => ClassificationResult::notify(NotificationType::WhaleTransfer, None),
        MonitorMode::ExchangeDeposit => classify_exchange_deposit(to_label, from_label, policy),
        MonitorMode::Unknown(_) => ClassificationResult::skip(SkipReason::UnknownMode),
    }
}

fn classify_exchange_deposit(
    to_label: Option<&str>,
    from_label: Option<&str>,
    policy: &ClassifierPolicy,
) -> ClassificationResult {
    let Some(to_label) = to_label else {
        return ClassificationResult::skip(SkipReason::NoRecipientLabel);
    };
    let to_lower = to_label.to_lowercase();

    if !policy.has_deposit_keyword(&to_lower) {
        return ClassificationResult::skip(SkipReason::NoDepositKeyword);
    }

    let Some(exchange) = policy.match_exchange(&to_lower) else {
        return ClassificationResult::skip(SkipReason::NoExchangeMatch);
    };

    if let Some(from_label) = from_label {
        if policy.match_exchange(&from_label.to_lowercase()).is_some() {
            log::debug!("Skipping internal transfer: {} -> {}", from_label, to_label);
            return ClassificationResult::skip(SkipReason::InternalTransfer);
        }
    }

    ClassificationResult::notify(NotificationType::ExchangeDeposit, Some(exchange.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use alloy_primitives::U256;

    fn transfer() -> Transfer {
        Transfer {
            tx_hash: "0xhash".to_string(),
            from_address: "0xfrom".to_string(),
            to_address: "0xto".to_string(),
            raw_amount: U256::from(1u64),
            timestamp: 1_700_000_000,
        }
    }

    fn usd(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn policy() -> ClassifierPolicy {
        ClassifierPolicy::new(
            Decimal::from(100_000),
            vec!["Binance".to_string(), "OKX".to_string()],
            vec!["Deposit".to_string()],
        )
    }

    #[test]
    fn test_below_threshold_never_notifies() {
        let policy = policy();
        for mode in [
            MonitorMode::WhaleTransfer,
            MonitorMode::ExchangeDeposit,
            MonitorMode::Unknown("x".to_string()),
        ] {
            let result = classify(&transfer(), usd("99999.99"), Some("Binance Deposit 14"), None, &mode, &policy);
            assert!(!result.should_notify);
            assert_eq!(result.skip_reason, Some(SkipReason::BelowThreshold));
        }
    }

    #[test]
    fn test_threshold_equality_notifies() {
        let result = classify(&transfer(), usd("100000"), None, None, &MonitorMode::WhaleTransfer, &policy());
        assert!(result.should_notify);
    }

    #[test]
    fn test_whale_ignores_labels() {
        let policy = policy();
        let unlabeled = classify(&transfer(), usd("250000"), None, None, &MonitorMode::WhaleTransfer, &policy);
        let internal = classify(
            &transfer(),
            usd("250000"),
            Some("Binance Deposit 14"),
            Some("Binance Hot Wallet"),
            &MonitorMode::WhaleTransfer,
            &policy,
        );

        for result in [unlabeled, internal] {
            assert!(result.should_notify);
            assert_eq!(result.notification_type, Some(NotificationType::WhaleTransfer));
            assert_eq!(result.matched_exchange, None);
        }
    }

    #[test]
    fn test_exchange_deposit_from_external() {
        let result = classify(
            &transfer(),
            usd("150000"),
            Some("Binance Deposit 14"),
            None,
            &MonitorMode::ExchangeDeposit,
            &policy(),
        );

        assert!(result.should_notify);
        assert_eq!(result.notification_type, Some(NotificationType::ExchangeDeposit));
        assert_eq!(result.matched_exchange, Some("Binance".to_string()));
    }

    #[test]
    fn test_internal_transfer_suppressed() {
        let result = classify(
            &transfer(),
            usd("150000"),
            Some("Binance Deposit 14"),
            Some("Binance Hot Wallet"),
            &MonitorMode::ExchangeDeposit,
            &policy(),
        );

        assert!(!result.should_notify);
        assert_eq!(result.skip_reason, Some(SkipReason::InternalTransfer));
    }

    #[test]
    fn test_sender_from_other_exchange_also_suppressed() {
        let result = classify(
            &transfer(),
            usd("150000"),
            Some("Binance Deposit 14"),
            Some("okx cold wallet"),
            &MonitorMode::ExchangeDeposit,
            &policy(),
        );
        assert_eq!(result.skip_reason, Some(SkipReason::InternalTransfer));
    }

    #[test]
    fn test_recipient_label_requirements() {
        let policy = policy();
        let mode = MonitorMode::ExchangeDeposit;

        let missing = classify(&transfer(), usd("150000"), None, None, &mode, &policy);
        assert_eq!(missing.skip_reason, Some(SkipReason::NoRecipientLabel));

        let hot_wallet = classify(&transfer(), usd("150000"), Some("Binance Hot Wallet"), None, &mode, &policy);
        assert_eq!(hot_wallet.skip_reason, Some(SkipReason::NoDepositKeyword));

        let unknown_exchange = classify(&transfer(), usd("150000"), Some("Kraken Deposit"), None, &mode, &policy);
        assert_eq!(unknown_exchange.skip_reason, Some(SkipReason::NoExchangeMatch));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let result = classify(
            &transfer(),
            usd("150000"),
            Some("BINANCE: deposit wallet"),
            Some("some whale"),
            &MonitorMode::ExchangeDeposit,
            &policy(),
        );
        assert!(result.should_notify);
        assert_eq!(result.matched_exchange, Some("Binance".to_string()));
    }

    #[test]
    fn test_first_configured_exchange_wins() {
        let policy = ClassifierPolicy::new(
            Decimal::ZERO,
            vec!["OKX".to_string(), "Binance".to_string()],
            vec!["Deposit".to_string()],
        );
        let result = classify(
            &transfer(),
            usd("1"),
            Some("Binance to OKX Deposit"),
            None,
            &MonitorMode::ExchangeDeposit,
            &policy,
        );
        assert_eq!(result.matched_exchange, Some("OKX".to_string()));
    }

    #[test]
    fn test_empty_lists_silence_exchange_mode() {
        let no_keywords = ClassifierPolicy::new(Decimal::ZERO, vec!["Binance".to_string()], vec![]);
        let no_exchanges = ClassifierPolicy::new(Decimal::ZERO, vec![], vec!["Deposit".to_string()]);
        let mode = MonitorMode::ExchangeDeposit;

        assert!(!classify(&transfer(), usd("1000000000"), Some("Binance Deposit 1"), None, &mode, &no_keywords).should_notify);
        assert!(!classify(&transfer(), usd("1000000000"), Some("Binance Deposit 1"), None, &mode, &no_exchanges).should_notify);
    }

    #[test]
    fn test_unknown_mode_is_silent() {
        let result = classify(
            &transfer(),
            usd("1000000000"),
            Some("Binance Deposit 14"),
            None,
            &MonitorMode::Unknown("exchange_withdrawal".to_string()),
            &policy(),
        );
        assert!(!result.should_notify);
        assert_eq!(result.skip_reason, Some(SkipReason::UnknownMode));
    }
}
