//! Shared test utilities.
//!
//! Builders for menu items and transactions with sensible defaults, a throwaway
//! in-memory store, and a gateway double that records what the session mirrors.

use crate::{
    core::Action,
    errors::Result,
    models::{
        AppState, BalanceLoad, CartItem, LoadStatus, MenuItem, Order, OrderStatus, PurchaseBill,
        RemoteState, ServiceKind, ServiceRequest, ServiceStatus, Transaction, cart_total,
    },
    persistence::{LocalStore, PersistenceGateway},
    session::Session,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates a [`LocalStore`] over an in-memory `SQLite` database with tables initialized.
pub async fn setup_store() -> Result<LocalStore> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(LocalStore::new(db, "test-state"))
}

/// Menu item whose name equals its id.
pub fn menu_item(id: &str, price: f64) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        price,
        image_url: String::new(),
        category: "Mains".to_string(),
    }
}

/// UTC timestamp on the hour.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Paid, preparing order of a single line totalling `total`.
pub fn order(id: &str, phone: &str, total: f64, created: DateTime<Utc>) -> Transaction {
    Transaction::Order(Order {
        id: id.to_string(),
        items: vec![CartItem::single(menu_item("momo", total))],
        total_price: total,
        status: OrderStatus::Preparing,
        notes: None,
        created,
        is_paid: true,
        user_phone: Some(phone.to_string()),
    })
}

/// Wallet load created on 1 May 2024.
pub fn load(id: &str, phone: &str, amount: f64, status: LoadStatus) -> Transaction {
    Transaction::Load(balance_load(id, phone, amount, status, at(2024, 5, 1, 9)))
}

/// Bare wallet load payload.
pub fn balance_load(
    id: &str,
    phone: &str,
    amount: f64,
    status: LoadStatus,
    created: DateTime<Utc>,
) -> BalanceLoad {
    BalanceLoad {
        id: id.to_string(),
        amount,
        created,
        user_phone: Some(phone.to_string()),
        status,
    }
}

/// Supplier bill.
pub fn expense(id: &str, amount: f64, created: DateTime<Utc>) -> Transaction {
    Transaction::Expense(PurchaseBill {
        id: id.to_string(),
        supplier: "Kalimati Market".to_string(),
        description: "Vegetables".to_string(),
        amount,
        created,
    })
}

/// Pending water request.
pub fn service(id: &str, phone: &str) -> ServiceRequest {
    ServiceRequest {
        id: id.to_string(),
        sub_type: ServiceKind::Water,
        user_phone: Some(phone.to_string()),
        created: at(2024, 5, 1, 13),
        status: ServiceStatus::Pending,
        table_number: None,
    }
}

/// Initialized, logged-out state.
pub fn ready_state() -> AppState {
    AppState {
        is_loading: false,
        ..AppState::default()
    }
}

/// Initialized state with `phone` logged in at `balance`.
pub fn logged_in_state(phone: &str, balance: f64) -> AppState {
    AppState {
        is_logged_in: true,
        phone: Some(phone.to_string()),
        balance,
        ..ready_state()
    }
}

/// `PLACE_ORDER` for the current cart, the way the checkout dispatcher builds it.
pub fn place_order_action(state: &AppState, id: &str, created: DateTime<Utc>) -> Action {
    let total_price = cart_total(&state.cart_items);
    Action::PlaceOrder {
        order: Order {
            id: id.to_string(),
            items: state.cart_items.clone(),
            total_price,
            status: OrderStatus::Preparing,
            notes: None,
            created,
            is_paid: true,
            user_phone: state.phone.clone(),
        },
        new_balance: state.balance - total_price,
    }
}

/// Gateway double that records every sync it receives.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    remote: Option<RemoteState>,
    accept: bool,
    transactions: Mutex<Vec<Transaction>>,
    menus: Mutex<Vec<Vec<MenuItem>>>,
}

impl RecordingGateway {
    /// Unreachable for reads, accepts every sync.
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            accept: true,
            ..Self::default()
        })
    }

    /// Rejects every sync (but still records the attempt).
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers the startup fetch with the given catalog and log.
    pub fn with_remote(menu_items: Vec<MenuItem>, transactions: Vec<Transaction>) -> Arc<Self> {
        Arc::new(Self {
            remote: Some(RemoteState {
                menu_items,
                transactions,
            }),
            accept: true,
            ..Self::default()
        })
    }

    /// Answers the startup fetch with whatever the remote decoder produced.
    pub fn answering(remote: Option<RemoteState>) -> Arc<Self> {
        Arc::new(Self {
            remote,
            accept: true,
            ..Self::default()
        })
    }

    /// Ids of every transaction synced, in arrival order.
    pub fn synced_ids(&self) -> Vec<String> {
        self.synced_transactions()
            .iter()
            .map(|tx| tx.id().to_string())
            .collect()
    }

    /// Statuses mirrored for one order.
    pub fn synced_statuses(&self, order_id: &str) -> Vec<OrderStatus> {
        self.synced_transactions()
            .iter()
            .filter_map(|tx| match tx {
                Transaction::Order(order) if order.id == order_id => Some(order.status),
                _ => None,
            })
            .collect()
    }

    /// Every menu pushed, in arrival order.
    pub fn synced_menus(&self) -> Vec<Vec<MenuItem>> {
        self.menus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of transaction syncs attempted.
    pub fn attempts(&self) -> usize {
        self.synced_transactions().len()
    }

    fn synced_transactions(&self) -> Vec<Transaction> {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn fetch_state(&self, _phone: Option<&str>) -> Option<RemoteState> {
        self.remote.clone()
    }

    async fn sync_transaction(&self, tx: &Transaction) -> bool {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx.clone());
        self.accept
    }

    async fn sync_menu(&self, items: &[MenuItem]) -> bool {
        self.menus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(items.to_vec());
        self.accept
    }
}

/// Session started from `default_menu` over a fresh store and an accepting gateway.
pub async fn started_session(default_menu: Vec<MenuItem>) -> Result<(Session, Arc<RecordingGateway>)> {
    started_session_with(RecordingGateway::accepting(), default_menu).await
}

/// Session started from `default_menu` over a fresh store and the given gateway.
pub async fn started_session_with(
    gateway: Arc<RecordingGateway>,
    default_menu: Vec<MenuItem>,
) -> Result<(Session, Arc<RecordingGateway>)> {
    init_test_tracing();
    let store = setup_store().await?;
    let session = Session::start(Arc::clone(&gateway) as Arc<dyn PersistenceGateway>, store, default_menu).await;
    Ok((session, gateway))
}
