//! Regional price selection for checkout.

/// Billing region requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Korea,
    Default,
}

impl Region {
    /// Case-insensitive; only `KR` selects the Korean tier.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_uppercase()).as_deref() {
            Some("KR") => Region::Korea,
            _ => Region::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Korea => "KR",
            Region::Default => "DEFAULT",
        }
    }
}

/// Configured price identifiers. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceTable {
    pub default_price_id: Option<String>,
    pub korea_price_id: Option<String>,
}

impl PriceTable {
    pub fn new(default_price_id: Option<String>, korea_price_id: Option<String>) -> Self {
        Self {
            default_price_id: default_price_id.filter(|p| !p.trim().is_empty()),
            korea_price_id: korea_price_id.filter(|p| !p.trim().is_empty()),
        }
    }

    /// Korea uses its own price when configured and falls back to the default
    /// price; every other region uses the default price.
    pub fn select(&self, region: Region) -> Option<&str> {
        match region {
            Region::Korea => self
                .korea_price_id
                .as_deref()
                .or(self.default_price_id.as_deref()),
            Region::Default => self.default_price_id.as_deref(),
        }
    }

    /// Price to retry with after a currency-combination failure, if it differs
    /// from the one that failed.
    pub fn fallback_for(&self, tried: &str) -> Option<&str> {
        self.default_price_id.as_deref().filter(|p| *p != tried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(default: Option<&str>, korea: Option<&str>) -> PriceTable {
        PriceTable::new(default.map(String::from), korea.map(String::from))
    }

    #[test]
    fn test_region_from_raw() {
        assert_eq!(Region::from_raw(Some("KR")), Region::Korea);
        assert_eq!(Region::from_raw(Some("kr")), Region::Korea);
        assert_eq!(Region::from_raw(Some("DEFAULT")), Region::Default);
        assert_eq!(Region::from_raw(Some("US")), Region::Default);
        assert_eq!(Region::from_raw(None), Region::Default);
    }

    #[test]
    fn test_korea_uses_korea_price_when_configured() {
        let prices = table(Some("price_default"), Some("price_kr"));
        assert_eq!(prices.select(Region::Korea), Some("price_kr"));
    }

    #[test]
    fn test_korea_falls_back_to_default_price() {
        let prices = table(Some("price_default"), None);
        assert_eq!(prices.select(Region::Korea), Some("price_default"));
    }

    #[test]
    fn test_other_regions_ignore_korea_price() {
        let prices = table(Some("price_default"), Some("price_kr"));
        assert_eq!(prices.select(Region::Default), Some("price_default"));
    }

    #[test]
    fn test_missing_default_price() {
        let prices = table(None, Some("price_kr"));
        assert_eq!(prices.select(Region::Default), None);
        assert_eq!(prices.select(Region::Korea), Some("price_kr"));
        assert_eq!(table(None, None).select(Region::Korea), None);
    }

    #[test]
    fn test_blank_ids_are_unset() {
        let prices = table(Some("  "), Some(""));
        assert_eq!(prices, PriceTable::default());
    }

    #[test]
    fn test_fallback_only_when_different() {
        let prices = table(Some("price_default"), Some("price_kr"));
        assert_eq!(prices.fallback_for("price_kr"), Some("price_default"));
        assert_eq!(prices.fallback_for("price_default"), None);
        assert_eq!(table(None, Some("price_kr")).fallback_for("price_kr"), None);
    }
}
