//! The state machine - the only code that mutates an [`AppState`].
//!
//! [`reduce`] is a pure transition function: no I/O, no clock, no randomness. Every
//! id and timestamp arrives pre-computed inside the [`Action`], so any recorded
//! sequence of actions replays to the same state.
//!
//! The wallet balance is maintained here incrementally (orders, confirmations and
//! admin credits patch it), while [`crate::core::ledger::calculate_balance`] derives
//! it from the log at login. The two must never disagree, which is why every
//! balance-affecting transition goes through this module.

use super::ledger::calculate_balance;
use crate::models::{
    AppState, BalanceLoad, CartItem, LoadStatus, MenuItem, Order, OrderStatus, PurchaseBill,
    ServiceRequest, ServiceStatus, StatePatch, Transaction, View,
};

/// Closed set of state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Toggle the startup loading flag
    SetLoading(bool),
    /// Merge the startup snapshot and finish loading
    InitializeState(StatePatch),
    /// Attach a customer phone and recompute its balance from the log
    Login {
        /// Customer phone
        phone: String,
    },
    /// Detach the customer and drop per-user state
    Logout,
    /// Switch screens
    SetView(View),
    /// Replace the cart wholesale
    SetCart(Vec<CartItem>),
    /// Record a checkout
    PlaceOrder {
        /// Fully formed order
        order: Order,
        /// Balance after paying `order.total_price`
        new_balance: f64,
    },
    /// Move an order forward in the kitchen pipeline
    UpdateOrderStatus {
        /// Target order
        order_id: String,
        /// Requested status
        status: OrderStatus,
    },
    /// Settle an order
    MarkOrderPaid {
        /// Target order
        order_id: String,
    },
    /// Record a supplier bill
    AddExpense(PurchaseBill),
    /// Record a customer's request to top up their wallet
    LoadBalance(BalanceLoad),
    /// Approve a pending wallet load
    ConfirmLoad {
        /// Target load
        transaction_id: String,
    },
    /// Credit a wallet directly from the dashboard
    AdminAddFunds(BalanceLoad),
    /// Append a menu item
    AddMenuItem(MenuItem),
    /// Replace the menu item with the same id
    EditMenuItem(MenuItem),
    /// Remove a menu item
    DeleteMenuItem {
        /// Target item
        id: String,
    },
    /// Record a table service request
    RequestService(ServiceRequest),
    /// Mark a service request as handled
    ResolveService {
        /// Target request
        id: String,
    },
    /// Replace the favourite ids
    SetFavorites(Vec<String>),
    /// Replace the notes for the next order
    SetOrderNotes(String),
    /// Show a notification
    SetToast(String),
}

/// Applies `action` to `state` and returns the next state.
#[must_use]
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::SetLoading(is_loading) => state.is_loading = is_loading,
        Action::InitializeState(patch) => {
            apply_patch(&mut state, patch);
            state.is_loading = false;
        }
        Action::Login { phone } => {
            state.balance = calculate_balance(&phone, &state.transactions);
            state.is_logged_in = true;
            state.view = View::Menu;
            state.phone = Some(phone);
            state.toast_message = "Login successful!".to_string();
        }
        Action::Logout => {
            state.is_logged_in = false;
            state.cart_items.clear();
            state.view = View::Home;
            state.phone = None;
            state.balance = 0.0;
            state.favorite_item_ids.clear();
            state.order_notes.clear();
            state.toast_message = "You have been logged out.".to_string();
        }
        Action::SetView(view) => state.view = view,
        Action::SetCart(items) => state.cart_items = items,
        Action::PlaceOrder { order, new_balance } => {
            prepend(&mut state.transactions, Transaction::Order(order));
            state.balance = new_balance;
            state.cart_items.clear();
            state.order_notes.clear();
        }
        Action::UpdateOrderStatus { order_id, status } => {
            if let Some(order) = find_order(&mut state.transactions, &order_id)
                && status > order.status
            {
                order.status = status;
            }
        }
        Action::MarkOrderPaid { order_id } => {
            if let Some(order) = find_order(&mut state.transactions, &order_id) {
                order.is_paid = true;
            }
        }
        Action::AddExpense(bill) => prepend(&mut state.transactions, Transaction::Expense(bill)),
        Action::LoadBalance(mut load) => {
            load.status = LoadStatus::Pending;
            prepend(&mut state.transactions, Transaction::Load(load));
        }
        Action::ConfirmLoad { transaction_id } => {
            let credit = find_load(&mut state.transactions, &transaction_id)
                .filter(|load| load.status == LoadStatus::Pending)
                .map(|load| {
                    load.status = LoadStatus::Confirmed;
                    (load.user_phone.clone(), load.amount)
                });
            if let Some((owner, amount)) = credit {
                credit_if_active(&mut state, owner.as_deref(), amount);
            }
        }
        Action::AdminAddFunds(mut load) => {
            load.status = LoadStatus::Confirmed;
            let owner = load.user_phone.clone();
            let amount = load.amount;
            prepend(&mut state.transactions, Transaction::Load(load));
            credit_if_active(&mut state, owner.as_deref(), amount);
        }
        Action::AddMenuItem(item) => state.menu_items.push(item),
        Action::EditMenuItem(item) => {
            if let Some(existing) = state.menu_items.iter_mut().find(|i| i.id == item.id) {
                *existing = item;
            }
        }
        Action::DeleteMenuItem { id } => state.menu_items.retain(|item| item.id != id),
        Action::RequestService(request) => {
            prepend(&mut state.transactions, Transaction::Service(request));
        }
        Action::ResolveService { id } => {
            let request = state.transactions.iter_mut().find_map(|tx| match tx {
                Transaction::Service(request) if request.id == id => Some(request),
                _ => None,
            });
            if let Some(request) = request {
                request.status = ServiceStatus::Resolved;
            }
        }
        Action::SetFavorites(ids) => state.favorite_item_ids = ids,
        Action::SetOrderNotes(notes) => state.order_notes = notes,
        Action::SetToast(message) => state.toast_message = message,
    }
    state
}

/// The one place new entries enter the log. Newest first, never re-sorted.
fn prepend(transactions: &mut Vec<Transaction>, tx: Transaction) {
    transactions.insert(0, tx);
}

fn credit_if_active(state: &mut AppState, owner: Option<&str>, amount: f64) {
    if owner.is_some() && owner == state.phone.as_deref() {
        state.balance += amount;
    }
}

fn apply_patch(state: &mut AppState, patch: StatePatch) {
    let StatePatch {
        is_logged_in,
        menu_items,
        cart_items,
        transactions,
        balance,
        favorite_item_ids,
        phone,
    } = patch;

    if let Some(v) = is_logged_in {
        state.is_logged_in = v;
    }
    if let Some(v) = menu_items {
        state.menu_items = v;
    }
    if let Some(v) = cart_items {
        state.cart_items = v;
    }
    if let Some(v) = transactions {
        state.transactions = v;
    }
    if let Some(v) = balance {
        state.balance = v;
    }
    if let Some(v) = favorite_item_ids {
        state.favorite_item_ids = v;
    }
    if let Some(v) = phone {
        state.phone = v;
    }
}

fn find_order<'a>(transactions: &'a mut [Transaction], id: &str) -> Option<&'a mut Order> {
    transactions.iter_mut().find_map(|tx| match tx {
        Transaction::Order(order) if order.id == id => Some(order),
        _ => None,
    })
}

fn find_load<'a>(transactions: &'a mut [Transaction], id: &str) -> Option<&'a mut BalanceLoad> {
    transactions.iter_mut().find_map(|tx| match tx {
        Transaction::Load(load) if load.id == id => Some(load),
        _ => None,
    })
}
