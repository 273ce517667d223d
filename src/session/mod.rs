//! Session layer - the state container and its use-case dispatchers.
//!
//! A [`Session`] owns one [`AppState`] and is the only way to change it. Each
//! dispatcher (in [`customer`] and [`admin`]) follows the same shape:
//!
//! 1. validate the intent against the current state,
//! 2. on failure write a notification and return the error, leaving state untouched,
//! 3. build the full payload, generating ids and timestamps here and never in the reducer,
//! 4. run the reducer and mirror the result to the local store,
//! 5. spawn a fire-and-forget remote sync whose failure is only logged.
//!
//! Nothing here panics; every failure resolves to a notification or a log line.
//!
//! Admin dispatchers perform no authorization check beyond what the caller does.
//! Any holder of a `Session` can confirm loads or credit wallets.

/// Staff dashboard intents
pub mod admin;
/// Customer intents
pub mod customer;

use crate::core::{Action, reduce};
use crate::errors::{Error, Result};
use crate::models::{AppState, MenuItem, StatePatch, StoredState, Transaction};
use crate::persistence::{LocalStore, PersistenceGateway};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Session shared with background loops
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Owner of the application state for one device
pub struct Session {
    state: AppState,
    gateway: Arc<dyn PersistenceGateway>,
    store: LocalStore,
    syncs: JoinSet<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("store", &self.store)
            .field("pending_syncs", &self.syncs.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session in the initial loading state without touching any store.
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>, store: LocalStore) -> Self {
        Self {
            state: AppState::default(),
            gateway,
            store,
            syncs: JoinSet::new(),
        }
    }

    /// Creates a session and seeds it from the first source that answers.
    ///
    /// The remote store wins if it responds at all. Otherwise the device's saved
    /// state is used, and `default_menu` fills in a missing or empty catalog. There
    /// is no merging between sources.
    pub async fn start(
        gateway: Arc<dyn PersistenceGateway>,
        store: LocalStore,
        default_menu: Vec<MenuItem>,
    ) -> Self {
        let mut session = Self::new(gateway, store);
        session.dispatch(Action::SetLoading(true)).await;

        let patch = if let Some(remote) = session.gateway.fetch_state(None).await {
            info!(
                "Seeding session from remote store ({} menu items, {} transactions)",
                remote.menu_items.len(),
                remote.transactions.len()
            );
            StatePatch::shared(remote.menu_items, remote.transactions)
        } else {
            let saved = session.store.load().await.unwrap_or_else(|e| {
                error!("Failed to read local state: {e}");
                None
            });
            match saved {
                Some(saved) => {
                    info!(
                        "Seeding session from local state ({} transactions)",
                        saved.transactions.len()
                    );
                    let mut patch = saved.into_patch();
                    if patch.menu_items.as_ref().is_none_or(Vec::is_empty) {
                        patch.menu_items = Some(default_menu);
                    }
                    patch
                }
                None => {
                    info!("No saved state; seeding menu from default catalog");
                    StatePatch {
                        menu_items: Some(default_menu),
                        ..StatePatch::default()
                    }
                }
            }
        };

        session.dispatch(Action::InitializeState(patch)).await;
        session
    }

    /// Wraps the session for sharing with background loops.
    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of remote syncs spawned but not yet collected.
    #[must_use]
    pub fn pending_syncs(&self) -> usize {
        self.syncs.len()
    }

    /// Waits for every in-flight remote sync to finish.
    pub async fn settle_syncs(&mut self) {
        while let Some(joined) = self.syncs.join_next().await {
            if let Err(e) = joined {
                warn!("Remote sync task ended abnormally: {e}");
            }
        }
    }

    /// Runs the reducer and mirrors the result locally once loading is over.
    pub(crate) async fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);

        if self.state.is_loading {
            return;
        }
        if let Err(e) = self.store.save(&StoredState::capture(&self.state)).await {
            error!("Failed to mirror state to local store: {e}");
        }
    }

    /// Shows `message` to the user.
    pub(crate) async fn notify(&mut self, message: impl Into<String>) {
        self.dispatch(Action::SetToast(message.into())).await;
    }

    /// Surfaces a validation failure and hands it back to the caller.
    pub(crate) async fn reject<T>(&mut self, error: Error) -> Result<T> {
        debug!("Rejected intent: {error}");
        self.notify(error.to_string()).await;
        Err(error)
    }

    /// Fails with [`Error::LoginRequired`] unless a customer is logged in.
    pub(crate) async fn require_login(&mut self, action: &'static str) -> Result<String> {
        match (&self.state.phone, self.state.is_logged_in) {
            (Some(phone), true) => Ok(phone.clone()),
            _ => self.reject(Error::LoginRequired { action }).await,
        }
    }

    /// Looks up a transaction by id after the reducer ran, for mirroring.
    pub(crate) fn find_transaction(&self, id: &str) -> Option<&Transaction> {
        self.state.transactions.iter().find(|tx| tx.id() == id)
    }

    /// Mirrors one transaction to the remote store in the background.
    pub(crate) fn spawn_transaction_sync(&mut self, tx: Transaction) {
        self.reap_finished_syncs();
        let gateway = Arc::clone(&self.gateway);
        self.syncs.spawn(async move {
            if gateway.sync_transaction(&tx).await {
                debug!("Synced {} {}", tx.kind(), tx.id());
            } else {
                warn!("Remote sync of {} {} failed; local state stands", tx.kind(), tx.id());
            }
        });
    }

    /// Mirrors the current menu to the remote store in the background.
    pub(crate) fn spawn_menu_sync(&mut self) {
        self.reap_finished_syncs();
        let gateway = Arc::clone(&self.gateway);
        let items = self.state.menu_items.clone();
        self.syncs.spawn(async move {
            if gateway.sync_menu(&items).await {
                debug!("Synced menu of {} items", items.len());
            } else {
                warn!("Remote menu sync failed; local menu stands");
            }
        });
    }

    fn reap_finished_syncs(&mut self) {
        while let Some(joined) = self.syncs.try_join_next() {
            if let Err(e) = joined {
                warn!("Remote sync task ended abnormally: {e}");
            }
        }
    }
}

/// Fresh transaction id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Checks that a money amount is a positive, finite number.
pub(crate) fn validate_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount { amount })
    }
}
