//! In-memory address label cache
//!
//! Populated from the label store at run start. Keys are lowercased on
//! insert and lookup so checksummed and plain addresses resolve the same.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LabelResolver {
    labels: HashMap<String, String>,
}

impl LabelResolver {
    pub fn new(labels: HashMap<String, String>) -> Self {
        let labels = labels
            .into_iter()
            .map(|(address, label)| (address.to_lowercase(), label))
            .collect();
        Self { labels }
    }

    pub fn resolve(&self, address: &str) -> Option<&str> {
        self.labels.get(&address.to_lowercase()).map(String::as_str)
    }

    /// Labels for (from, to)
    pub fn resolve_pair(&self, from: &str, to: &str) -> (Option<&str>, Option<&str>) {
        (self.resolve(from), self.resolve(to))
    }

    pub fn insert(&mut self, address: &str, label: impl Into<String>) {
        self.labels.insert(address.to_lowercase(), label.into());
    }

    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut map = HashMap::new();
        map.insert("0xAbCdEf0000000000000000000000000000000001".to_string(), "Binance Deposit 14".to_string());
        let resolver = LabelResolver::new(map);

        assert_eq!(
            resolver.resolve("0xabcdef0000000000000000000000000000000001"),
            Some("Binance Deposit 14")
        );
        assert_eq!(
            resolver.resolve("0xABCDEF0000000000000000000000000000000001"),
            Some("Binance Deposit 14")
        );
        assert_eq!(resolver.resolve("0x0000000000000000000000000000000000000002"), None);
    }

    #[test]
    fn test_resolve_pair_order() {
        let mut resolver = LabelResolver::default();
        resolver.insert("0xFROM", "Whale A");
        resolver.insert("0xto", "OKX Deposit");

        assert_eq!(resolver.resolve_pair("0xfrom", "0xTO"), (Some("Whale A"), Some("OKX Deposit")));
        assert_eq!(resolver.resolve_pair("0xnone", "0xto"), (None, Some("OKX Deposit")));
        assert_eq!(resolver.len(), 2);
    }
}
