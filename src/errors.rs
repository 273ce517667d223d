//! Unified error types for the ordering core.
//!
//! Validation variants double as user notifications: their `Display` text is what
//! the session writes into the toast slot when a dispatcher rejects an intent.

use thiserror::Error;

/// All errors produced by the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Local store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote gateway transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote gateway answered with a non-success status
    #[error("Remote store rejected the request with status {status}")]
    RemoteStatus {
        /// HTTP status code returned
        status: u16,
    },

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding failure
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The intent requires a logged-in customer
    #[error("Please log in to {action}.")]
    LoginRequired {
        /// What the customer tried to do
        action: &'static str,
    },

    /// Login attempted without a phone number
    #[error("Please enter a valid phone number.")]
    InvalidPhone,

    /// Checkout attempted with nothing in the cart
    #[error("Your cart is empty.")]
    EmptyCart,

    /// Wallet balance cannot cover the order total
    #[error("Insufficient balance to place order.")]
    InsufficientFunds {
        /// Balance at the time of the attempt
        current: f64,
        /// Order total that was requested
        required: f64,
    },

    /// Amount is zero, negative, or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// No transaction of the expected kind carries this id
    #[error("No {kind} found with id {id}.")]
    TransactionNotFound {
        /// Expected transaction kind (`order`, `load`, `service`)
        kind: &'static str,
        /// Id that was looked up
        id: String,
    },

    /// Balance load was already confirmed
    #[error("Wallet load {id} is already confirmed.")]
    LoadAlreadyConfirmed {
        /// Id of the load
        id: String,
    },

    /// Order status may only move forward
    #[error("Order {id} cannot move from {from} back to {to}.")]
    StatusRegression {
        /// Id of the order
        id: String,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// No menu item carries this id
    #[error("Menu item {id} not found.")]
    MenuItemNotFound {
        /// Id that was looked up
        id: String,
    },

    /// Menu item failed validation
    #[error("Invalid menu item: {message}")]
    InvalidMenuItem {
        /// Reason for the rejection
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
