//! HTTP client for the remote state API.
//!
//! Speaks the three endpoints of the state API:
//! `GET {base}/state[?phone=]`, `POST {base}/sync/transaction` and
//! `POST {base}/sync/menu`. Every failure is logged here and reported to the caller
//! as `None`/`false`.

use super::PersistenceGateway;
use crate::errors::{Error, Result};
use crate::models::{MenuItem, RemoteState, Transaction};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Acknowledgement returned by both sync endpoints
#[derive(Debug, Deserialize)]
struct SyncAck {
    #[serde(default)]
    success: bool,
}

/// Remote store reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Creates a client for the API rooted at `base_url` (e.g. `https://host/api`).
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of an endpoint path such as `"sync/menu"`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn try_fetch_state(&self, phone: Option<&str>) -> Result<RemoteState> {
        let mut request = self.client.get(self.endpoint("state"));
        if let Some(phone) = phone {
            request = request.query(&[("phone", phone)]);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(RemoteState::decode(&body)?)
    }

    async fn try_post<B: Serialize + Sync + ?Sized>(&self, path: &str, body: &B) -> Result<bool> {
        let response = self.client.post(self.endpoint(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteStatus {
                status: status.as_u16(),
            });
        }
        let ack: SyncAck = response.json().await?;
        Ok(ack.success)
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn fetch_state(&self, phone: Option<&str>) -> Option<RemoteState> {
        match self.try_fetch_state(phone).await {
            Ok(state) => {
                debug!(
                    "Fetched {} menu items and {} transactions from remote store",
                    state.menu_items.len(),
                    state.transactions.len()
                );
                Some(state)
            }
            Err(e) => {
                warn!("Remote store unavailable, falling back to local state: {e}");
                None
            }
        }
    }

    async fn sync_transaction(&self, tx: &Transaction) -> bool {
        match self.try_post("sync/transaction", tx).await {
            Ok(success) => success,
            Err(e) => {
                warn!("Failed to sync {} {}: {e}", tx.kind(), tx.id());
                false
            }
        }
    }

    async fn sync_menu(&self, items: &[MenuItem]) -> bool {
        match self.try_post("sync/menu", items).await {
            Ok(success) => success,
            Err(e) => {
                warn!("Failed to sync menu of {} items: {e}", items.len());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{at, order};

    #[test]
    fn test_endpoint_joins_paths() {
        let gateway = HttpGateway::new("https://floyds.example/api/", 5).unwrap();
        assert_eq!(gateway.endpoint("state"), "https://floyds.example/api/state");
        assert_eq!(
            gateway.endpoint("/sync/menu"),
            "https://floyds.example/api/sync/menu"
        );
    }

    #[test]
    fn test_sync_ack_defaults_to_failure() {
        let ack: SyncAck = serde_json::from_str("{}").unwrap();
        assert!(!ack.success);
        let ack: SyncAck = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(ack.success);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_swallowed() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let gateway = HttpGateway::new("http://127.0.0.1:9/api", 1).unwrap();
        assert!(gateway.fetch_state(None).await.is_none());
        assert!(
            !gateway
                .sync_transaction(&order("o1", "9800000000", 10.0, at(2024, 5, 1, 12)))
                .await
        );
        assert!(!gateway.sync_menu(&[]).await);
    }
}
