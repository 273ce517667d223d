//! Persistence gateway - the remote mirror and the local durable fallback.
//!
//! The two sinks are independent and share no transaction. Local state is
//! authoritative for the running session; the remote store is a best-effort mirror
//! that is only read once, at startup. The result is eventual consistency at best:
//! a sync that fails is lost until some later full fetch happens to reconcile it.

/// Local durable store backed by `SQLite`
pub mod local;
/// HTTP client for the remote state API
pub mod remote;

pub use local::LocalStore;
pub use remote::HttpGateway;

use crate::models::{MenuItem, RemoteState, Transaction};
use async_trait::async_trait;
use std::sync::Arc;

/// Best-effort access to the remote store.
///
/// None of these calls may fail loudly: an unreachable or misbehaving store shows
/// up as `None` or `false` and the caller carries on.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Full catalog plus the transactions visible to `phone` (all when `None`).
    async fn fetch_state(&self, phone: Option<&str>) -> Option<RemoteState>;

    /// Upserts one transaction by id.
    async fn sync_transaction(&self, tx: &Transaction) -> bool;

    /// Replaces the whole menu.
    async fn sync_menu(&self, items: &[MenuItem]) -> bool;
}

/// Gateway used when no remote store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

#[async_trait]
impl PersistenceGateway for OfflineGateway {
    async fn fetch_state(&self, _phone: Option<&str>) -> Option<RemoteState> {
        None
    }

    async fn sync_transaction(&self, _tx: &Transaction) -> bool {
        false
    }

    async fn sync_menu(&self, _items: &[MenuItem]) -> bool {
        false
    }
}

/// Builds the gateway described by the configuration.
pub fn gateway_from_config(
    config: &crate::config::app::ApiConfig,
) -> crate::errors::Result<Arc<dyn PersistenceGateway>> {
    match config.base_url.as_deref() {
        Some(base_url) => Ok(Arc::new(HttpGateway::new(base_url, config.timeout_secs)?)),
        None => {
            tracing::info!("No remote store configured; running offline");
            Ok(Arc::new(OfflineGateway))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::app::ApiConfig;
    use crate::test_utils::{at, order};

    #[tokio::test]
    async fn test_offline_gateway_never_answers() {
        let gateway = OfflineGateway;
        assert!(gateway.fetch_state(None).await.is_none());
        assert!(
            !gateway
                .sync_transaction(&order("o1", "9800000000", 10.0, at(2024, 5, 1, 12)))
                .await
        );
        assert!(!gateway.sync_menu(&[]).await);
    }

    #[tokio::test]
    async fn test_gateway_from_config_without_url_is_offline() -> crate::errors::Result<()> {
        let gateway = gateway_from_config(&ApiConfig::default())?;
        assert!(gateway.fetch_state(Some("9800000000")).await.is_none());
        Ok(())
    }
}
