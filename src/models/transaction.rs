//! Transaction log entries.
//!
//! Every movement of money or service in the restaurant is one variant of
//! [`Transaction`], serialized with an explicit `type` tag so the remote mirror and
//! the local blob can store them in a single list. Entries are append-only; admin
//! edits only ever flip status fields.

use super::menu::CartItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use tracing::warn;

/// Kitchen progress of an order. Variants are declared in the only allowed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// In the kitchen
    Preparing,
    /// On its way to the customer
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    /// Handed over
    Delivered,
}

impl OrderStatus {
    /// Status that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Preparing => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Human-readable label, identical to the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval state of a wallet load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Waiting for staff to see the money
    Pending,
    /// Credited to the wallet
    Confirmed,
}

/// State of a table service request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceStatus {
    /// Not yet handled
    Pending,
    /// Handled by staff
    Resolved,
}

/// What the table asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// A jug of water
    Water,
}

/// A placed order, paid from the customer's wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier
    pub id: String,
    /// Cart snapshot at checkout
    pub items: Vec<CartItem>,
    /// Frozen total of `items` at checkout
    pub total_price: f64,
    /// Kitchen progress
    pub status: OrderStatus,
    /// Free-form instructions for the kitchen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the order was placed
    pub created: DateTime<Utc>,
    /// Whether the order has been settled
    #[serde(default)]
    pub is_paid: bool,
    /// Phone of the customer who ordered
    #[serde(default)]
    pub user_phone: Option<String>,
}

/// A request to credit a customer's wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceLoad {
    /// Unique identifier
    pub id: String,
    /// Rupees to credit
    pub amount: f64,
    /// When the request was made
    pub created: DateTime<Utc>,
    /// Wallet owner
    #[serde(default)]
    pub user_phone: Option<String>,
    /// Approval state
    pub status: LoadStatus,
}

/// A supplier bill paid by the restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBill {
    /// Unique identifier
    pub id: String,
    /// Who was paid
    pub supplier: String,
    /// What was bought
    pub description: String,
    /// Rupees spent
    pub amount: f64,
    /// When the bill was recorded
    pub created: DateTime<Utc>,
}

/// A table asking staff for something
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    /// Unique identifier
    pub id: String,
    /// What was requested
    pub sub_type: ServiceKind,
    /// Phone of the requesting customer
    #[serde(default)]
    pub user_phone: Option<String>,
    /// When the request was made
    pub created: DateTime<Utc>,
    /// Handling state
    pub status: ServiceStatus,
    /// Table the request came from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
}

/// One entry of the transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transaction {
    /// Customer order
    Order(Order),
    /// Wallet load
    Load(BalanceLoad),
    /// Restaurant expense
    Expense(PurchaseBill),
    /// Table service request
    Service(ServiceRequest),
}

impl Transaction {
    /// Unique identifier of the entry.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Order(order) => &order.id,
            Self::Load(load) => &load.id,
            Self::Expense(bill) => &bill.id,
            Self::Service(request) => &request.id,
        }
    }

    /// Creation timestamp of the entry.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        match self {
            Self::Order(order) => order.created,
            Self::Load(load) => load.created,
            Self::Expense(bill) => bill.created,
            Self::Service(request) => request.created,
        }
    }

    /// Customer phone the entry belongs to. Expenses never have one.
    #[must_use]
    pub fn user_phone(&self) -> Option<&str> {
        match self {
            Self::Order(order) => order.user_phone.as_deref(),
            Self::Load(load) => load.user_phone.as_deref(),
            Self::Service(request) => request.user_phone.as_deref(),
            Self::Expense(_) => None,
        }
    }

    /// Wire tag of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Load(_) => "load",
            Self::Expense(_) => "expense",
            Self::Service(_) => "service",
        }
    }
}

/// Decodes each JSON value independently, dropping the ones that do not parse.
///
/// Used for every list that crosses a storage boundary so one corrupt record never
/// prevents the rest of the state from loading.
pub fn decode_lenient<T: DeserializeOwned>(values: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Dropping malformed {what} record: {e}");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!("Kept {} of {} {what} records", decoded.len(), total);
    }
    decoded
}
