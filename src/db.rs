use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::utils;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("payload error in {collection}: {source}")]
    Payload {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A record that lives in one collection and is identified by a natural key.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn natural_key(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents(
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                payload TEXT NOT NULL,
                first_seen_utc TEXT NOT NULL,
                last_seen_utc TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            );",
        )?;
        Ok(())
    }

    pub fn find_by_key<T: Document>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM documents WHERE collection = ?1 AND key = ?2",
                params![T::COLLECTION, key],
                |row| row.get(0),
            )
            .optional()?;
        payload.map(|text| decode::<T>(&text)).transpose()
    }

    /// Inserts the record, or replaces every field of the stored one.
    ///
    /// `Updated` is only reported when the stored payload actually differs.
    pub fn upsert<T: Document>(&self, record: &T) -> Result<UpsertOutcome, StoreError> {
        let key = record.natural_key();
        let now = Utc::now().to_rfc3339();
        let candidate = serde_json::to_value(record).map_err(|source| StoreError::Payload {
            collection: T::COLLECTION,
            source,
        })?;

        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM documents WHERE collection = ?1 AND key = ?2",
                params![T::COLLECTION, key],
                |row| row.get(0),
            )
            .optional()?;

        let payload = candidate.to_string();
        match existing {
            None => {
                self.conn.execute(
                    "INSERT INTO documents (collection, key, payload, first_seen_utc, last_seen_utc)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![T::COLLECTION, key, payload, now],
                )?;
                Ok(UpsertOutcome::Inserted)
            }
            Some(stored) => {
                let stored: Value =
                    serde_json::from_str(&stored).map_err(|source| StoreError::Payload {
                        collection: T::COLLECTION,
                        source,
                    })?;
                let outcome = if stored == candidate {
                    UpsertOutcome::Unchanged
                } else {
                    UpsertOutcome::Updated
                };
                self.conn.execute(
                    "UPDATE documents SET payload = ?3, last_seen_utc = ?4
                     WHERE collection = ?1 AND key = ?2",
                    params![T::COLLECTION, key, payload, now],
                )?;
                Ok(outcome)
            }
        }
    }

    pub fn list<T: Document>(&self) -> Result<Vec<T>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![T::COLLECTION], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(decode::<T>(&row?)?);
        }
        Ok(out)
    }

    #[cfg(test)]
    pub(crate) fn count(&self, collection: &str) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?)
    }
}

fn decode<T: Document>(payload: &str) -> Result<T, StoreError> {
    serde_json::from_str(payload).map_err(|source| StoreError::Payload {
        collection: T::COLLECTION,
        source,
    })
}
