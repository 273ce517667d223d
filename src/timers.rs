//! Background loops - simulated order progression and the opening-hours flag.
//!
//! Both loops run until their [`CancellationToken`] fires. Neither owns any state:
//! progression goes through the same dispatcher an admin would use, and the
//! opening-hours flag is published on a watch channel.

use crate::config::app::{OpeningHours, ProgressionConfig};
use crate::models::{OrderStatus, Transaction};
use crate::session::SharedSession;
use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Timelike, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Status every undelivered order should have reached by `now`.
///
/// An order leaves the kitchen `preparing_secs` after it was created and is
/// delivered `delivery_secs` after that. Only forward moves are returned.
#[must_use]
pub fn due_status_advances(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    config: &ProgressionConfig,
) -> Vec<(String, OrderStatus)> {
    let out_after = secs(config.preparing_secs);
    let delivered_after = out_after + secs(config.delivery_secs);

    transactions
        .iter()
        .filter_map(|tx| match tx {
            Transaction::Order(order) if order.status != OrderStatus::Delivered => Some(order),
            _ => None,
        })
        .filter_map(|order| {
            let elapsed = now - order.created;
            let due = if elapsed >= delivered_after {
                OrderStatus::Delivered
            } else if elapsed >= out_after {
                OrderStatus::OutForDelivery
            } else {
                return None;
            };
            (due > order.status).then(|| (order.id.clone(), due))
        })
        .collect()
}

fn secs(value: u64) -> ChronoDuration {
    ChronoDuration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Advances placed orders through the kitchen on a fixed poll.
pub fn spawn_order_progression(
    session: SharedSession,
    config: ProgressionConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Order progression started ({}s preparing, {}s delivery)",
            config.preparing_secs, config.delivery_secs
        );
        let mut ticker = tokio::time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut session = session.lock().await;
                    let due = due_status_advances(&session.state().transactions, Utc::now(), &config);
                    for (order_id, status) in due {
                        debug!("Advancing order {order_id} to {status}");
                        if let Err(e) = session.update_order_status(&order_id, status).await {
                            warn!("Could not advance order {order_id}: {e}");
                        }
                    }
                }
                () = shutdown.cancelled() => {
                    info!("Order progression stopped");
                    return;
                }
            }
        }
    })
}

/// Whether the restaurant is open at `now`, judged by the local hour of its zone.
#[must_use]
pub fn is_open<Tz: TimeZone>(hours: &OpeningHours, now: &DateTime<Tz>) -> bool {
    hours.is_open_at(now.hour())
}

/// Publishes the open/closed flag, re-evaluated every `check_interval_secs`.
pub fn spawn_open_hours_watch(
    hours: OpeningHours,
    shutdown: CancellationToken,
) -> (watch::Receiver<bool>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(is_open(&hours, &Local::now()));

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(hours.check_interval_secs.max(1)));
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let open = is_open(&hours, &Local::now());
                    let changed = tx.send_if_modified(|current| {
                        let changed = *current != open;
                        *current = open;
                        changed
                    });
                    if changed {
                        info!("Restaurant is now {}", if open { "open" } else { "closed" });
                    }
                }
                () = shutdown.cancelled() => return,
            }
        }
    });

    (rx, handle)
}
