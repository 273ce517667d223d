//! The session state tree and its persisted projections.

use super::menu::{CartItem, MenuItem};
use super::transaction::{Transaction, decode_lenient};
use serde::{Deserialize, Serialize};

/// Screen the customer is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Landing page
    #[default]
    Home,
    /// Menu browser
    Menu,
    /// Cart and checkout
    Cart,
    /// Shown right after a successful order
    Confirmation,
    /// Restaurant info and opening hours
    About,
    /// Wallet and order history
    Profile,
    /// Staff dashboard
    Admin,
}

/// Everything one session knows.
///
/// `balance` is derived from `transactions`: it is recomputed at login and then
/// patched by the reducer on every order, confirmation and admin credit.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// A customer phone is attached to the session
    pub is_logged_in: bool,
    /// Startup fetch still in progress; nothing is mirrored locally meanwhile
    pub is_loading: bool,
    /// Current screen
    pub view: View,
    /// Shared catalog
    pub menu_items: Vec<MenuItem>,
    /// In-progress cart of the logged-in customer
    pub cart_items: Vec<CartItem>,
    /// Shared log, newest first
    pub transactions: Vec<Transaction>,
    /// Wallet balance of `phone`
    pub balance: f64,
    /// Ids of favourite menu items
    pub favorite_item_ids: Vec<String>,
    /// Notes for the next order
    pub order_notes: String,
    /// Last notification shown to the user
    pub toast_message: String,
    /// Logged-in customer
    pub phone: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            is_logged_in: false,
            is_loading: true,
            view: View::Home,
            menu_items: Vec::new(),
            cart_items: Vec::new(),
            transactions: Vec::new(),
            balance: 0.0,
            favorite_item_ids: Vec::new(),
            order_notes: String::new(),
            toast_message: String::new(),
            phone: None,
        }
    }
}

/// Partial state merged by `INITIALIZE_STATE`; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct StatePatch {
    pub is_logged_in: Option<bool>,
    pub menu_items: Option<Vec<MenuItem>>,
    pub cart_items: Option<Vec<CartItem>>,
    pub transactions: Option<Vec<Transaction>>,
    pub balance: Option<f64>,
    pub favorite_item_ids: Option<Vec<String>>,
    pub phone: Option<Option<String>>,
}

impl StatePatch {
    /// Patch seeding only the shared catalog and log, as the remote store provides.
    #[must_use]
    pub fn shared(menu_items: Vec<MenuItem>, transactions: Vec<Transaction>) -> Self {
        Self {
            menu_items: Some(menu_items),
            transactions: Some(transactions),
            ..Self::default()
        }
    }
}

/// The blob mirrored to local durable storage after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct StoredState {
    pub is_logged_in: bool,
    pub cart_items: Vec<CartItem>,
    pub transactions: Vec<Transaction>,
    pub balance: f64,
    pub favorite_item_ids: Vec<String>,
    pub phone: Option<String>,
    pub menu_items: Vec<MenuItem>,
}

impl StoredState {
    /// Projects the persisted fields out of a state.
    #[must_use]
    pub fn capture(state: &AppState) -> Self {
        Self {
            is_logged_in: state.is_logged_in,
            cart_items: state.cart_items.clone(),
            transactions: state.transactions.clone(),
            balance: state.balance,
            favorite_item_ids: state.favorite_item_ids.clone(),
            phone: state.phone.clone(),
            menu_items: state.menu_items.clone(),
        }
    }

    /// Decodes a stored blob, dropping individual records that no longer parse.
    pub fn decode(json: &str) -> serde_json::Result<Self> {
        let raw: RawStoredState = serde_json::from_str(json)?;
        Ok(Self {
            is_logged_in: raw.is_logged_in,
            cart_items: decode_lenient(raw.cart_items, "cart item"),
            transactions: decode_lenient(raw.transactions, "transaction"),
            balance: raw.balance,
            favorite_item_ids: raw.favorite_item_ids,
            phone: raw.phone,
            menu_items: decode_lenient(raw.menu_items, "menu item"),
        })
    }

    /// Converts the blob into an initialization patch.
    #[must_use]
    pub fn into_patch(self) -> StatePatch {
        StatePatch {
            is_logged_in: Some(self.is_logged_in),
            menu_items: Some(self.menu_items),
            cart_items: Some(self.cart_items),
            transactions: Some(self.transactions),
            balance: Some(self.balance),
            favorite_item_ids: Some(self.favorite_item_ids),
            phone: Some(self.phone),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStoredState {
    #[serde(default)]
    is_logged_in: bool,
    #[serde(default)]
    cart_items: Vec<serde_json::Value>,
    #[serde(default)]
    transactions: Vec<serde_json::Value>,
    #[serde(default)]
    balance: f64,
    #[serde(default)]
    favorite_item_ids: Vec<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    menu_items: Vec<serde_json::Value>,
}

/// What the remote store returns from `GET /state`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteState {
    /// Full catalog
    pub menu_items: Vec<MenuItem>,
    /// Log entries visible to the caller, newest first
    pub transactions: Vec<Transaction>,
}

impl RemoteState {
    /// Decodes a response body, dropping individual records that do not parse.
    ///
    /// The body must be an object carrying a `menuItems` or `transactions` array.
    /// Anything else (an error object, a bare array, `null`) is rejected so the
    /// caller falls back to its local state instead of seeding from nothing.
    pub fn decode(json: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(mut body) = value else {
            return Err(serde::de::Error::custom("state body is not a JSON object"));
        };

        let mut take_list = |key: &str| -> serde_json::Result<Option<Vec<serde_json::Value>>> {
            match body.remove(key) {
                Some(serde_json::Value::Array(values)) => Ok(Some(values)),
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(_) => Err(serde::de::Error::custom(format!("`{key}` is not an array"))),
            }
        };
        let menu_items = take_list("menuItems")?;
        let transactions = take_list("transactions")?;
        if menu_items.is_none() && transactions.is_none() {
            return Err(serde::de::Error::custom(
                "state body has neither `menuItems` nor `transactions`",
            ));
        }

        Ok(Self {
            menu_items: decode_lenient(menu_items.unwrap_or_default(), "menu item"),
            transactions: decode_lenient(transactions.unwrap_or_default(), "transaction"),
        })
    }
}
