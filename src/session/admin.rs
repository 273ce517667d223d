//! Staff dashboard intents.
//!
//! None of these check who is calling; see the module docs of [`crate::session`].

use super::{Session, new_id, validate_amount};
use crate::core::Action;
use crate::core::report::format_rupees;
use crate::errors::{Error, Result};
use crate::models::{
    BalanceLoad, LoadStatus, MenuItem, OrderStatus, PurchaseBill, ServiceStatus, Transaction,
};
use chrono::Utc;
use tracing::{info, instrument};

impl Session {
    /// Moves an order forward in its lifecycle.
    ///
    /// Setting the status it already has is a no-op; moving it backwards is rejected.
    #[instrument(skip(self))]
    pub async fn update_order_status(&mut self, order_id: &str, status: OrderStatus) -> Result<()> {
        let current = match self.find_transaction(order_id) {
            Some(Transaction::Order(order)) => order.status,
            _ => {
                return self
                    .reject(Error::TransactionNotFound {
                        kind: "order",
                        id: order_id.to_string(),
                    })
                    .await;
            }
        };
        if status == current {
            return Ok(());
        }
        if status < current {
            return self
                .reject(Error::StatusRegression {
                    id: order_id.to_string(),
                    from: current.to_string(),
                    to: status.to_string(),
                })
                .await;
        }

        info!("Order {order_id}: {current} -> {status}");
        self.dispatch(Action::UpdateOrderStatus {
            order_id: order_id.to_string(),
            status,
        })
        .await;
        self.mirror_transaction(order_id);
        Ok(())
    }

    /// Flags an order as settled.
    pub async fn mark_order_paid(&mut self, order_id: &str) -> Result<()> {
        if !matches!(self.find_transaction(order_id), Some(Transaction::Order(_))) {
            return self
                .reject(Error::TransactionNotFound {
                    kind: "order",
                    id: order_id.to_string(),
                })
                .await;
        }
        self.dispatch(Action::MarkOrderPaid {
            order_id: order_id.to_string(),
        })
        .await;
        self.mirror_transaction(order_id);
        self.notify("Order marked as paid.").await;
        Ok(())
    }

    /// Records a supplier bill.
    pub async fn add_expense(
        &mut self,
        supplier: &str,
        description: &str,
        amount: f64,
    ) -> Result<PurchaseBill> {
        let amount = match validate_amount(amount) {
            Ok(amount) => amount,
            Err(e) => return self.reject(e).await,
        };
        let bill = PurchaseBill {
            id: new_id(),
            supplier: supplier.trim().to_string(),
            description: description.trim().to_string(),
            amount,
            created: Utc::now(),
        };
        self.dispatch(Action::AddExpense(bill.clone())).await;
        self.spawn_transaction_sync(Transaction::Expense(bill.clone()));
        self.notify("Expense recorded successfully.").await;
        Ok(bill)
    }

    /// Approves a pending wallet load, crediting the owner if they are logged in here.
    #[instrument(skip(self))]
    pub async fn confirm_load(&mut self, transaction_id: &str) -> Result<()> {
        let status = match self.find_transaction(transaction_id) {
            Some(Transaction::Load(load)) => load.status,
            _ => {
                return self
                    .reject(Error::TransactionNotFound {
                        kind: "load",
                        id: transaction_id.to_string(),
                    })
                    .await;
            }
        };
        if status == LoadStatus::Confirmed {
            return self
                .reject(Error::LoadAlreadyConfirmed {
                    id: transaction_id.to_string(),
                })
                .await;
        }

        self.dispatch(Action::ConfirmLoad {
            transaction_id: transaction_id.to_string(),
        })
        .await;
        self.mirror_transaction(transaction_id);
        self.notify("Wallet load confirmed.").await;
        Ok(())
    }

    /// Credits `amount` straight to the wallet of `phone`, already confirmed.
    #[instrument(skip(self))]
    pub async fn admin_add_funds(&mut self, phone: &str, amount: f64) -> Result<BalanceLoad> {
        let phone = phone.trim();
        if phone.is_empty() {
            return self.reject(Error::InvalidPhone).await;
        }
        let amount = match validate_amount(amount) {
            Ok(amount) => amount,
            Err(e) => return self.reject(e).await,
        };

        let load = BalanceLoad {
            id: new_id(),
            amount,
            created: Utc::now(),
            user_phone: Some(phone.to_string()),
            status: LoadStatus::Confirmed,
        };
        self.dispatch(Action::AdminAddFunds(load.clone())).await;
        self.spawn_transaction_sync(Transaction::Load(load.clone()));
        self.notify(format!(
            "Successfully added {} to {phone}.",
            format_rupees(amount)
        ))
        .await;
        Ok(load)
    }

    /// Adds a new dish to the catalog.
    pub async fn add_menu_item(&mut self, item: MenuItem) -> Result<()> {
        if let Err(e) = item.validate() {
            return self.reject(e).await;
        }
        if self.state.menu_items.iter().any(|i| i.id == item.id) {
            return self
                .reject(Error::InvalidMenuItem {
                    message: format!("duplicate id {}", item.id),
                })
                .await;
        }
        self.dispatch(Action::AddMenuItem(item)).await;
        self.spawn_menu_sync();
        self.notify("Menu item added.").await;
        Ok(())
    }

    /// Replaces the catalog entry with the same id.
    pub async fn edit_menu_item(&mut self, item: MenuItem) -> Result<()> {
        if let Err(e) = item.validate() {
            return self.reject(e).await;
        }
        if !self.state.menu_items.iter().any(|i| i.id == item.id) {
            return self.reject(Error::MenuItemNotFound { id: item.id }).await;
        }
        self.dispatch(Action::EditMenuItem(item)).await;
        self.spawn_menu_sync();
        self.notify("Menu item updated.").await;
        Ok(())
    }

    /// Removes a dish from the catalog. Carts and past orders keep their copies.
    pub async fn delete_menu_item(&mut self, id: &str) -> Result<()> {
        if !self.state.menu_items.iter().any(|i| i.id == id) {
            return self
                .reject(Error::MenuItemNotFound { id: id.to_string() })
                .await;
        }
        self.dispatch(Action::DeleteMenuItem { id: id.to_string() })
            .await;
        self.spawn_menu_sync();
        self.notify("Menu item deleted.").await;
        Ok(())
    }

    /// Closes a pending service request.
    pub async fn resolve_service_request(&mut self, id: &str) -> Result<()> {
        let status = match self.find_transaction(id) {
            Some(Transaction::Service(request)) => request.status,
            _ => {
                return self
                    .reject(Error::TransactionNotFound {
                        kind: "service",
                        id: id.to_string(),
                    })
                    .await;
            }
        };
        if status == ServiceStatus::Resolved {
            return Ok(());
        }
        self.dispatch(Action::ResolveService { id: id.to_string() })
            .await;
        self.mirror_transaction(id);
        Ok(())
    }

    fn mirror_transaction(&mut self, id: &str) {
        if let Some(tx) = self.find_transaction(id).cloned() {
            self.spawn_transaction_sync(tx);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::calculate_balance;
    use crate::test_utils::{RecordingGateway, menu_item, started_session};
    use std::sync::Arc;

    const PHONE: &str = "9800000000";
    const OTHER: &str = "9811111111";

    fn order_status(session: &Session, id: &str) -> OrderStatus {
        match session.find_transaction(id) {
            Some(Transaction::Order(order)) => order.status,
            other => panic!("expected order, got {other:?}"),
        }
    }

    async fn session_with_order() -> Result<(Session, String, Arc<RecordingGateway>)> {
        let (mut session, gateway) = started_session(vec![menu_item("momo", 200.0)]).await?;
        session.admin_add_funds(PHONE, 500.0).await?;
        session.login(PHONE).await?;
        session.add_to_cart("momo").await?;
        let order = session.place_order().await?;
        Ok((session, order.id, gateway))
    }

    #[tokio::test]
    async fn test_admin_add_funds_for_other_customer() -> Result<()> {
        let (mut session, _) = started_session(vec![]).await?;
        session.login(PHONE).await?;

        let load = session.admin_add_funds(OTHER, 500.0).await?;
        let state = session.state();
        assert_eq!(load.status, LoadStatus::Confirmed);
        assert_eq!(state.transactions[0].id(), load.id);
        assert_eq!(state.balance, 0.0);
        assert_eq!(calculate_balance(OTHER, &state.transactions), 500.0);
        assert_eq!(state.toast_message, format!("Successfully added Nrs. 500 to {OTHER}."));

        session.admin_add_funds(PHONE, 250.0).await?;
        assert_eq!(session.state().balance, 250.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_add_funds_validation() -> Result<()> {
        let (mut session, _) = started_session(vec![]).await?;
        assert!(matches!(
            session.admin_add_funds(" ", 10.0).await,
            Err(Error::InvalidPhone)
        ));
        assert!(matches!(
            session.admin_add_funds(OTHER, 0.0).await,
            Err(Error::InvalidAmount { .. })
        ));
        assert!(session.state().transactions.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_load_twice_is_rejected() -> Result<()> {
        let (mut session, _) = started_session(vec![]).await?;
        session.login(PHONE).await?;
        let load = session.load_balance(300.0).await?;

        session.confirm_load(&load.id).await?;
        assert_eq!(session.state().balance, 300.0);
        assert_eq!(session.state().toast_message, "Wallet load confirmed.");

        let again = session.confirm_load(&load.id).await;
        assert!(matches!(again, Err(Error::LoadAlreadyConfirmed { .. })));
        assert_eq!(session.state().balance, 300.0);

        assert!(matches!(
            session.confirm_load("missing").await,
            Err(Error::TransactionNotFound { kind: "load", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_load_for_absent_customer_leaves_balance() -> Result<()> {
        let (mut session, _) = started_session(vec![]).await?;
        session.login(OTHER).await?;
        let load = session.load_balance(300.0).await?;
        session.login(PHONE).await?;

        session.confirm_load(&load.id).await?;
        let state = session.state();
        assert_eq!(state.balance, 0.0);
        assert_eq!(calculate_balance(OTHER, &state.transactions), 300.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_status_moves_forward_only() -> Result<()> {
        let (mut session, order_id, gateway) = session_with_order().await?;

        session
            .update_order_status(&order_id, OrderStatus::OutForDelivery)
            .await?;
        assert_eq!(order_status(&session, &order_id), OrderStatus::OutForDelivery);

        session
            .update_order_status(&order_id, OrderStatus::OutForDelivery)
            .await?;
        let back = session
            .update_order_status(&order_id, OrderStatus::Preparing)
            .await;
        assert!(matches!(back, Err(Error::StatusRegression { .. })));
        assert_eq!(order_status(&session, &order_id), OrderStatus::OutForDelivery);

        session
            .update_order_status(&order_id, OrderStatus::Delivered)
            .await?;
        assert_eq!(order_status(&session, &order_id), OrderStatus::Delivered);

        // status changes never touch the wallet
        assert_eq!(session.state().balance, 300.0);

        session.settle_syncs().await;
        let mut mirrored = gateway.synced_statuses(&order_id);
        mirrored.sort();
        assert_eq!(
            mirrored,
            vec![
                OrderStatus::Preparing,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_of_unknown_order() -> Result<()> {
        let (mut session, _) = started_session(vec![]).await?;
        let result = session
            .update_order_status("nope", OrderStatus::Delivered)
            .await;
        assert!(matches!(
            result,
            Err(Error::TransactionNotFound { kind: "order", .. })
        ));
        assert_eq!(session.state().toast_message, "No order found with id nope.");
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_order_paid() -> Result<()> {
        let (mut session, order_id, _) = session_with_order().await?;
        session.mark_order_paid(&order_id).await?;
        assert_eq!(session.state().toast_message, "Order marked as paid.");
        assert!(session.mark_order_paid("ghost").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_expense() -> Result<()> {
        let (mut session, gateway) = started_session(vec![]).await?;
        let bill = session
            .add_expense(" Bhatbhateni ", "Flour and oil", 1200.0)
            .await?;
        assert_eq!(bill.supplier, "Bhatbhateni");
        assert_eq!(session.state().transactions[0].id(), bill.id);
        assert_eq!(session.state().toast_message, "Expense recorded successfully.");
        assert!(session.add_expense("x", "y", -1.0).await.is_err());

        session.settle_syncs().await;
        assert_eq!(gateway.synced_ids(), vec![bill.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_management() -> Result<()> {
        let (mut session, gateway) = started_session(vec![menu_item("momo", 200.0)]).await?;

        session.add_menu_item(menu_item("tea", 50.0)).await?;
        assert_eq!(session.state().toast_message, "Menu item added.");
        assert!(matches!(
            session.add_menu_item(menu_item("tea", 60.0)).await,
            Err(Error::InvalidMenuItem { .. })
        ));
        assert!(session.add_menu_item(menu_item("", 60.0)).await.is_err());

        session.edit_menu_item(menu_item("tea", 60.0)).await?;
        assert_eq!(session.state().menu_items[1].price, 60.0);
        assert!(matches!(
            session.edit_menu_item(menu_item("ghost", 1.0)).await,
            Err(Error::MenuItemNotFound { .. })
        ));

        session.delete_menu_item("momo").await?;
        assert_eq!(session.state().menu_items.len(), 1);
        assert_eq!(session.state().toast_message, "Menu item deleted.");
        assert!(session.delete_menu_item("momo").await.is_err());

        session.settle_syncs().await;
        let menus = gateway.synced_menus();
        assert_eq!(menus.len(), 3);
        assert!(menus.iter().any(|menu| menu.len() == 1 && menu[0].id == "tea"));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_menu_item_keeps_cart_copy() -> Result<()> {
        let (mut session, _) = started_session(vec![menu_item("momo", 200.0)]).await?;
        session.login(PHONE).await?;
        session.add_to_cart("momo").await?;
        session.delete_menu_item("momo").await?;
        assert_eq!(session.state().cart_items[0].item.id, "momo");
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_service_request() -> Result<()> {
        let (mut session, _) = started_session(vec![]).await?;
        session.login(PHONE).await?;
        let request = session.request_water(None).await?;
        session.resolve_service_request(&request.id).await?;
        session.resolve_service_request(&request.id).await?;
        match session.find_transaction(&request.id) {
            Some(Transaction::Service(r)) => assert_eq!(r.status, ServiceStatus::Resolved),
            other => panic!("expected service request, got {other:?}"),
        }
        assert!(session.resolve_service_request("nope").await.is_err());
        Ok(())
    }
}
