//! Local state entity - key-value blobs for the device's durable fallback.
//!
//! The session mirrors its persisted projection here after every change, under a
//! fixed key, so a restart without the remote store still finds its data.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Local state database model - one JSON blob per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "local_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Storage key (e.g. `"floyds-app-state"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Serialized JSON blob
    pub value: String,
    /// When the blob was last written
    pub updated_at: DateTime,
}

/// `LocalState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
