//! Entity module - `SeaORM` definitions for the local durable store.

pub mod local_state;

pub use local_state::{Entity as LocalState, Model as LocalStateModel};
