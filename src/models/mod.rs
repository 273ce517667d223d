//! Domain model - menu, cart, transaction log, and the session state tree.
//!
//! Pure structure. Behaviour lives in [`crate::core`] and [`crate::session`].

/// Menu items and cart lines
pub mod menu;
/// Session state tree and its persisted projections
pub mod state;
/// Tagged transaction log entries
pub mod transaction;

pub use menu::{CartItem, MenuItem, cart_total};
pub use state::{AppState, RemoteState, StatePatch, StoredState, View};
pub use transaction::{
    BalanceLoad, LoadStatus, Order, OrderStatus, PurchaseBill, ServiceKind, ServiceRequest,
    ServiceStatus, Transaction,
};
