use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::Theme;

pub const DEFAULTS_KEY: &str = "defaults";
pub const TEMPLATE_KEY: &str = "template";
pub const HISTORY_KEY: &str = "history";

/// Whole-record persistence boundary. Records are read and written as one
/// blob per key, so swapping the medium never touches the calculation
/// code.
pub trait Storage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// One `<key>.json` file per record under the data directory.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: PathBuf) -> Self {
        JsonFileStorage { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for JsonFileStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }
}

/// In-memory stand-in used by tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Last-used preferences, applied at the next startup.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultsRecord {
    pub currency: Option<String>,
    pub theme: Option<Theme>,
}

/// Reusable invoice boilerplate, applied at the next startup.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateRecord {
    pub from: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub tax: Option<f64>,
}

/// A missing or corrupt record degrades to the empty default.
pub fn load_defaults(storage: &dyn Storage) -> DefaultsRecord {
    load_record(storage, DEFAULTS_KEY)
}

pub fn load_template(storage: &dyn Storage) -> TemplateRecord {
    load_record(storage, TEMPLATE_KEY)
}

pub fn save_defaults(storage: &mut dyn Storage, record: &DefaultsRecord) {
    save_record(storage, DEFAULTS_KEY, record);
}

pub fn save_template(storage: &mut dyn Storage, record: &TemplateRecord) {
    save_record(storage, TEMPLATE_KEY, record);
}

fn load_record<T>(storage: &dyn Storage, key: &str) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    storage
        .read(key)
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

fn save_record<T: Serialize>(storage: &mut dyn Storage, key: &str, record: &T) {
    let Ok(text) = serde_json::to_string_pretty(record) else {
        return;
    };
    if let Err(e) = storage.write(key, &text) {
        eprintln!("⚠️  Failed to save {}: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("data"));
        assert!(storage.read(DEFAULTS_KEY).is_none());

        storage.write(DEFAULTS_KEY, "{\"currency\":\"EUR\"}").unwrap();
        assert_eq!(
            storage.read(DEFAULTS_KEY).as_deref(),
            Some("{\"currency\":\"EUR\"}")
        );
        assert!(dir.path().join("data/defaults.json").exists());
    }

    #[test]
    fn missing_records_load_as_empty_defaults() {
        let storage = MemoryStorage::default();
        assert_eq!(load_defaults(&storage), DefaultsRecord::default());
        assert_eq!(load_template(&storage), TemplateRecord::default());
    }

    #[test]
    fn corrupt_records_load_as_empty_defaults() {
        let mut storage = MemoryStorage::default();
        storage.write(DEFAULTS_KEY, "{not json").unwrap();
        storage.write(TEMPLATE_KEY, "[1, 2, 3]").unwrap();
        assert_eq!(load_defaults(&storage), DefaultsRecord::default());
        assert_eq!(load_template(&storage), TemplateRecord::default());
    }

    #[test]
    fn defaults_record_round_trips() {
        let mut storage = MemoryStorage::default();
        let record = DefaultsRecord {
            currency: Some("CAD".into()),
            theme: Some(Theme::Dark),
        };
        save_defaults(&mut storage, &record);
        assert_eq!(load_defaults(&storage), record);
    }

    #[test]
    fn template_record_round_trips_and_skips_unknown_fields() {
        let mut storage = MemoryStorage::default();
        let record = TemplateRecord {
            from: Some("Studio Nine".into()),
            payment_terms: Some("Net 30".into()),
            notes: None,
            terms: Some("Payable within 30 days.".into()),
            tax: Some(8.875),
        };
        save_template(&mut storage, &record);
        assert_eq!(load_template(&storage), record);

        // extra keys from older versions are ignored, not fatal
        storage
            .write(TEMPLATE_KEY, "{\"from\":\"X\",\"legacy\":true}")
            .unwrap();
        assert_eq!(load_template(&storage).from.as_deref(), Some("X"));
    }
}
