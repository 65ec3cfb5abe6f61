use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

// Embedded so a fresh install always has a catalog to seed from
const DEFAULT_CATALOG: &str = include_str!("../currencies.json");

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CurrencyRecord {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    currencies: Vec<CurrencyRecord>,
}

/// Static currency lookup, loaded once at startup and read-only after.
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    records: Vec<CurrencyRecord>,
}

impl CurrencyCatalog {
    /// Read the catalog from `<root>/currencies.json`, seeding that file
    /// from the embedded default on first run. Any failure falls back to
    /// the built-in set so formatting keeps working.
    pub fn load(root: &Path) -> Self {
        let path = root.join("currencies.json");
        if !path.exists() {
            if let Err(e) = fs::write(&path, DEFAULT_CATALOG) {
                eprintln!("⚠️  Failed to seed currency catalog: {}", e);
            }
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("⚠️  Failed to read currency catalog: {}", e);
                return Self::fallback();
            }
        };
        match Self::parse(&text) {
            Some(catalog) => catalog,
            None => {
                eprintln!("⚠️  Currency catalog is malformed, using built-in set.");
                Self::fallback()
            }
        }
    }

    /// Parse a catalog document. Duplicate codes keep the first entry;
    /// an empty catalog is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let file: CatalogFile = serde_json::from_str(text).ok()?;
        if file.currencies.is_empty() {
            return None;
        }
        let mut records: Vec<CurrencyRecord> = Vec::with_capacity(file.currencies.len());
        for record in file.currencies {
            if !records.iter().any(|r| r.code == record.code) {
                records.push(record);
            }
        }
        Some(CurrencyCatalog { records })
    }

    /// Minimal built-in set, enough to keep the tool fully operational
    /// when the catalog document is unavailable.
    pub fn fallback() -> Self {
        let usd = CurrencyRecord {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            name: "USD ($)".to_string(),
        };
        let eur = CurrencyRecord {
            code: "EUR".to_string(),
            symbol: "€".to_string(),
            name: "EUR (€)".to_string(),
        };
        let gbp = CurrencyRecord {
            code: "GBP".to_string(),
            symbol: "£".to_string(),
            name: "GBP (£)".to_string(),
        };
        CurrencyCatalog {
            records: vec![usd, eur, gbp],
        }
    }

    pub fn records(&self) -> &[CurrencyRecord] {
        &self.records
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    /// Lookup with the safe fallback: unknown codes resolve to USD, or to
    /// the first entry should even USD be missing.
    pub fn resolve(&self, code: &str) -> &CurrencyRecord {
        self.get(code)
            .or_else(|| self.get("USD"))
            .unwrap_or(&self.records[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let catalog = CurrencyCatalog::parse(DEFAULT_CATALOG).unwrap();
        assert_eq!(catalog.records()[0].code, "USD");
        assert_eq!(catalog.get("USD").unwrap().symbol, "US$");
        assert!(catalog.get("EUR").is_some());
        assert!(catalog.get("GBP").is_some());
    }

    #[test]
    fn duplicate_codes_keep_the_first_entry() {
        let text = r#"{"currencies": [
            {"code": "USD", "symbol": "US$", "name": "US Dollar"},
            {"code": "USD", "symbol": "$", "name": "Duplicate"},
            {"code": "EUR", "symbol": "€", "name": "Euro"}
        ]}"#;
        let catalog = CurrencyCatalog::parse(text).unwrap();
        assert_eq!(catalog.records().len(), 2);
        assert_eq!(catalog.get("USD").unwrap().symbol, "US$");
    }

    #[test]
    fn malformed_or_empty_documents_are_rejected() {
        assert!(CurrencyCatalog::parse("not json").is_none());
        assert!(CurrencyCatalog::parse("{\"currencies\": []}").is_none());
    }

    #[test]
    fn fallback_set_covers_usd_eur_gbp() {
        let catalog = CurrencyCatalog::fallback();
        let codes: Vec<&str> = catalog.records().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["USD", "EUR", "GBP"]);
    }

    #[test]
    fn resolve_falls_back_to_usd_for_unknown_codes() {
        let catalog = CurrencyCatalog::fallback();
        assert_eq!(catalog.resolve("EUR").code, "EUR");
        assert_eq!(catalog.resolve("XXX").code, "USD");
        assert_eq!(catalog.resolve("").code, "USD");
    }
}
