//! Customer intents - login, cart, checkout, wallet, favourites, table service.

use super::{Session, new_id, validate_amount};
use crate::core::Action;
use crate::core::report::format_rupees;
use crate::errors::{Error, Result};
use crate::models::{
    BalanceLoad, CartItem, LoadStatus, Order, OrderStatus, ServiceKind, ServiceRequest,
    ServiceStatus, Transaction, View, cart_total, menu,
};
use chrono::Utc;
use tracing::{info, instrument};

impl Session {
    /// Attaches `phone` to the session and recomputes its wallet from the log.
    pub async fn login(&mut self, phone: &str) -> Result<()> {
        let phone = phone.trim();
        if phone.is_empty() {
            return self.reject(Error::InvalidPhone).await;
        }
        info!("Customer {phone} logged in");
        self.dispatch(Action::Login {
            phone: phone.to_string(),
        })
        .await;
        Ok(())
    }

    /// Detaches the current customer.
    pub async fn logout(&mut self) -> Result<()> {
        self.require_login("log out").await?;
        self.dispatch(Action::Logout).await;
        Ok(())
    }

    /// Switches screens.
    pub async fn set_view(&mut self, view: View) {
        self.dispatch(Action::SetView(view)).await;
    }

    /// Shows a notification.
    pub async fn set_toast(&mut self, message: &str) {
        self.notify(message).await;
    }

    /// Replaces the notes for the next order.
    pub async fn set_order_notes(&mut self, notes: &str) {
        self.dispatch(Action::SetOrderNotes(notes.to_string())).await;
    }

    /// Adds one portion of a menu item to the cart.
    pub async fn add_to_cart(&mut self, item_id: &str) -> Result<()> {
        self.require_login("add items to your cart").await?;
        let Some(item) = self.state.menu_items.iter().find(|i| i.id == item_id).cloned() else {
            return self
                .reject(Error::MenuItemNotFound {
                    id: item_id.to_string(),
                })
                .await;
        };

        let cart = menu::with_added_item(&self.state.cart_items, &item);
        self.dispatch(Action::SetCart(cart)).await;
        self.notify(format!("{} added to cart!", item.name)).await;
        Ok(())
    }

    /// Changes the quantity of a cart line by `change`; empty lines disappear.
    pub async fn update_quantity(&mut self, item_id: &str, change: i64) {
        let cart = menu::with_quantity_change(&self.state.cart_items, item_id, change);
        self.dispatch(Action::SetCart(cart)).await;
    }

    /// Refills the cart with the items of a past order and opens the cart.
    pub async fn quick_order(&mut self, order_id: &str) -> Result<()> {
        let items: Option<Vec<CartItem>> =
            self.find_transaction(order_id).and_then(|tx| match tx {
                Transaction::Order(order) => Some(order.items.clone()),
                _ => None,
            });
        let Some(items) = items else {
            return self
                .reject(Error::TransactionNotFound {
                    kind: "order",
                    id: order_id.to_string(),
                })
                .await;
        };
        self.dispatch(Action::SetCart(items)).await;
        self.dispatch(Action::SetView(View::Cart)).await;
        Ok(())
    }

    /// Checks out the current cart, paying from the wallet.
    ///
    /// The total is taken from the cart as it is now and frozen into the order.
    #[instrument(skip(self))]
    pub async fn place_order(&mut self) -> Result<Order> {
        let phone = self.require_login("place an order").await?;
        if self.state.cart_items.is_empty() {
            return self.reject(Error::EmptyCart).await;
        }

        let items = self.state.cart_items.clone();
        let total_price = cart_total(&items);
        let new_balance = self.state.balance - total_price;
        if new_balance < 0.0 {
            return self
                .reject(Error::InsufficientFunds {
                    current: self.state.balance,
                    required: total_price,
                })
                .await;
        }

        let notes = Some(self.state.order_notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let order = Order {
            id: new_id(),
            items,
            total_price,
            status: OrderStatus::Preparing,
            notes,
            created: Utc::now(),
            is_paid: true,
            user_phone: Some(phone),
        };

        info!("Order {} placed for {}", order.id, format_rupees(total_price));
        self.dispatch(Action::PlaceOrder {
            order: order.clone(),
            new_balance,
        })
        .await;
        self.spawn_transaction_sync(Transaction::Order(order.clone()));
        self.dispatch(Action::SetView(View::Confirmation)).await;
        Ok(order)
    }

    /// Asks staff to credit `amount` to the wallet; nothing changes until confirmed.
    pub async fn load_balance(&mut self, amount: f64) -> Result<BalanceLoad> {
        let phone = self.require_login("load your wallet").await?;
        let amount = match validate_amount(amount) {
            Ok(amount) => amount,
            Err(e) => return self.reject(e).await,
        };

        let load = BalanceLoad {
            id: new_id(),
            amount,
            created: Utc::now(),
            user_phone: Some(phone),
            status: LoadStatus::Pending,
        };
        self.dispatch(Action::LoadBalance(load.clone())).await;
        self.spawn_transaction_sync(Transaction::Load(load.clone()));
        self.notify(format!(
            "Request to load {} sent. Waiting for admin approval.",
            format_rupees(amount)
        ))
        .await;
        Ok(load)
    }

    /// Adds or removes a menu item from the favourites.
    pub async fn toggle_favorite(&mut self, item_id: &str) -> Result<()> {
        self.require_login("manage favorites").await?;
        let mut favorites = self.state.favorite_item_ids.clone();
        if let Some(pos) = favorites.iter().position(|id| id == item_id) {
            favorites.remove(pos);
        } else {
            favorites.push(item_id.to_string());
        }
        self.dispatch(Action::SetFavorites(favorites)).await;
        Ok(())
    }

    /// Calls a server over with water.
    pub async fn request_water(&mut self, table_number: Option<String>) -> Result<ServiceRequest> {
        let phone = self.require_login("request service").await?;
        let request = ServiceRequest {
            id: new_id(),
            sub_type: ServiceKind::Water,
            user_phone: Some(phone),
            created: Utc::now(),
            status: ServiceStatus::Pending,
            table_number,
        };
        self.dispatch(Action::RequestService(request.clone())).await;
        self.spawn_transaction_sync(Transaction::Service(request.clone()));
        self.notify("Water requested. A server will be with you shortly.")
            .await;
        Ok(request)
    }
}
