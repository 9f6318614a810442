//! Address label storage
//!
//! Backends:
//! - `JsonLabelStore`: flat `{ "0xaddress": "Label" }` file
//! - `SqliteLabelStore`: `address_labels` table, one row per address
//!
//! Both normalise addresses to lowercase. The whole map is read at run start
//! and written back at run end.

use crate::error::StoreError;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait LabelStore {
    /// Read every known label
    fn load(&self) -> Result<HashMap<String, String>, StoreError>;

    /// Write `labels` back to storage
    fn persist(&self, labels: &HashMap<String, String>) -> Result<(), StoreError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}

fn normalise(labels: HashMap<String, String>) -> HashMap<String, String> {
    labels
        .into_iter()
        .map(|(address, label)| (address.to_lowercase(), label))
        .collect()
}

pub struct JsonLabelStore {
    path: PathBuf,
}

impl JsonLabelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LabelStore for JsonLabelStore {
    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            log::info!("No label file found: {}", self.path.display());
            return Ok(HashMap::new());
        }

        let json = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<HashMap<String, String>>(&json) {
            Ok(labels) => Ok(normalise(labels)),
            Err(e) => {
                log::warn!("{} corrupted ({}), resetting...", self.path.display(), e);
                Ok(HashMap::new())
            }
        }
    }

    fn persist(&self, labels: &HashMap<String, String>) -> Result<(), StoreError> {
        // Sorted keys keep diffs of the label file readable
        let sorted: std::collections::BTreeMap<&String, &String> = labels.iter().collect();
        let json = serde_json::to_string_pretty(&sorted)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "json"
    }
}

pub struct SqliteLabelStore {
    conn: Connection,
}

impl SqliteLabelStore {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS address_labels (
                address TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self { conn })
    }
}

impl LabelStore for SqliteLabelStore {
    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT address, label FROM address_labels")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut labels = HashMap::new();
        for row in rows {
            let (address, label) = row?;
            labels.insert(address.to_lowercase(), label);
        }
        Ok(labels)
    }

    fn persist(&self, labels: &HashMap<String, String>) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO address_labels (address, label, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(address) DO UPDATE SET
                    label = excluded.label,
                    updated_at = excluded.updated_at
                 WHERE label != excluded.label",
            )?;
            for (address, label) in labels {
                stmt.execute(params![address.to_lowercase(), label, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "sqlite"
    }
}
