//! Local durable store.
//!
//! Holds the session's persisted projection as a single JSON blob under a fixed key
//! in the `local_state` table. Writes replace the blob wholesale.

use crate::{
    entities::{LocalState, local_state},
    errors::Result,
    models::StoredState,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, prelude::*};
use tracing::{trace, warn};

/// Durable key-value store for the session blob
#[derive(Debug, Clone)]
pub struct LocalStore {
    db: DatabaseConnection,
    key: String,
}

impl LocalStore {
    /// Wraps an initialized connection; `key` names the blob.
    #[must_use]
    pub fn new(db: DatabaseConnection, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    /// Key the blob is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the raw blob, if one was ever written.
    pub async fn read_raw(&self) -> Result<Option<String>> {
        let row = LocalState::find()
            .filter(local_state::Column::Key.eq(self.key.as_str()))
            .one(&self.db)
            .await?;
        Ok(row.map(|r| r.value))
    }

    /// Writes a raw blob, replacing any previous one.
    pub async fn write_raw(&self, value: String) -> Result<()> {
        let now = Utc::now().naive_utc();
        let existing = LocalState::find()
            .filter(local_state::Column::Key.eq(self.key.as_str()))
            .one(&self.db)
            .await?;

        if let Some(row) = existing {
            let mut active_model: local_state::ActiveModel = row.into();
            active_model.value = Set(value);
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_row = local_state::ActiveModel {
                key: Set(self.key.clone()),
                value: Set(value),
                updated_at: Set(now),
                ..Default::default()
            };
            new_row.insert(&self.db).await?;
        }
        Ok(())
    }

    /// Persists a snapshot.
    pub async fn save(&self, snapshot: &StoredState) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        trace!("Saving {} bytes of local state under {}", json.len(), self.key);
        self.write_raw(json).await
    }

    /// Loads the last snapshot.
    ///
    /// A missing row and an unreadable blob both come back as `None`; broken records
    /// inside an otherwise readable blob are dropped one by one.
    pub async fn load(&self) -> Result<Option<StoredState>> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(None);
        };
        match StoredState::decode(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("Discarding unreadable local state under {}: {e}", self.key);
                Ok(None)
            }
        }
    }
}
