use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Invoice;
use crate::store::{HISTORY_KEY, Storage};

/// Most snapshots the history keeps; saving past this evicts the oldest.
pub const HISTORY_CAP: usize = 50;

/// One saved invoice. The invoice fields are flattened so the persisted
/// shape is the snapshot itself plus its timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub saved_at: DateTime<Utc>,
}

/// Newest-first, capacity-bounded list of saved invoices. Entries are
/// independent copies; edits to the live draft never reach back into
/// saved history.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Load the whole list. A missing or corrupt record is an empty
    /// history, not an error.
    pub fn load(storage: &dyn Storage) -> Self {
        let mut store: HistoryStore = storage
            .read(HISTORY_KEY)
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        for entry in &mut store.entries {
            entry.invoice.normalize();
        }
        store
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deep-copy the invoice, stamp it, prepend, trim to capacity,
    /// persist the whole list.
    pub fn save_snapshot(&mut self, invoice: &Invoice, storage: &mut dyn Storage) {
        let entry = HistoryEntry {
            invoice: invoice.clone(),
            saved_at: Utc::now(),
        };
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        self.persist(storage);
    }

    /// Entry at `index` in newest-first order.
    pub fn load_snapshot(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Remove by position and persist; `false` when out of range.
    pub fn delete_snapshot(&mut self, index: usize, storage: &mut dyn Storage) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.entries.remove(index);
        self.persist(storage);
        true
    }

    fn persist(&self, storage: &mut dyn Storage) {
        let Ok(text) = serde_json::to_string_pretty(&self.entries) else {
            return;
        };
        if let Err(e) = storage.write(HISTORY_KEY, &text) {
            eprintln!("⚠️  Failed to save history: {}", e);
        }
    }
}
