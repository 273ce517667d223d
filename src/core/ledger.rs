//! Wallet derivations over the transaction log.
//!
//! The log is the only durable record of money movement; everything here is a pure
//! fold over it and is never stored on its own.

use crate::models::{LoadStatus, Transaction};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Bucket used for entries that carry no phone.
pub const GUEST: &str = "Guest";

/// Wallet balance of `phone`: confirmed loads minus order totals.
///
/// Pending loads, expenses and service requests do not count. The result does not
/// depend on the order of `transactions`.
#[must_use]
pub fn calculate_balance(phone: &str, transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.user_phone() == Some(phone))
        .map(|tx| match tx {
            Transaction::Load(load) if load.status == LoadStatus::Confirmed => load.amount,
            Transaction::Order(order) => -order.total_price,
            Transaction::Load(_) | Transaction::Expense(_) | Transaction::Service(_) => 0.0,
        })
        .sum()
}

/// Wallet summary of one customer as seen from the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct UserLedger {
    /// Customer phone, or [`GUEST`]
    pub phone: String,
    /// Confirmed loads minus order totals
    pub balance: f64,
    /// Number of orders placed
    pub total_orders: usize,
    /// Most recent order or load
    pub last_activity: DateTime<Utc>,
}

/// Groups orders and loads by customer phone, sorted by phone.
#[must_use]
pub fn user_ledgers(transactions: &[Transaction]) -> Vec<UserLedger> {
    let mut ledgers: BTreeMap<String, UserLedger> = BTreeMap::new();

    for tx in transactions {
        let (delta, is_order) = match tx {
            Transaction::Order(order) => (-order.total_price, true),
            Transaction::Load(load) if load.status == LoadStatus::Confirmed => (load.amount, false),
            Transaction::Load(_) => (0.0, false),
            Transaction::Expense(_) | Transaction::Service(_) => continue,
        };

        let phone = tx.user_phone().filter(|p| !p.trim().is_empty()).unwrap_or(GUEST);
        let created = tx.created();
        let ledger = ledgers
            .entry(phone.to_string())
            .or_insert_with(|| UserLedger {
                phone: phone.to_string(),
                balance: 0.0,
                total_orders: 0,
                last_activity: created,
            });

        ledger.balance += delta;
        if is_order {
            ledger.total_orders += 1;
        }
        if created > ledger.last_activity {
            ledger.last_activity = created;
        }
    }

    ledgers.into_values().collect()
}

/// Orders and loads belonging to `phone`, in log order.
#[must_use]
pub fn user_history<'a>(phone: &str, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|tx| matches!(tx, Transaction::Order(_) | Transaction::Load(_)))
        .filter(|tx| tx.user_phone() == Some(phone))
        .collect()
}

/// Number of orders placed by `phone`.
#[must_use]
pub fn order_count(phone: &str, transactions: &[Transaction]) -> usize {
    transactions
        .iter()
        .filter(|tx| matches!(tx, Transaction::Order(o) if o.user_phone.as_deref() == Some(phone)))
        .count()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{at, balance_load, expense, load, order, service};

    const PHONE: &str = "9800000000";

    fn sample_log() -> Vec<Transaction> {
        vec![
            order("o2", PHONE, 150.0, at(2024, 5, 3, 13)),
            Transaction::Service(service("s1", PHONE)),
            expense("e1", 2000.0, at(2024, 5, 3, 8)),
            Transaction::Load(balance_load(
                "l2",
                PHONE,
                300.0,
                LoadStatus::Pending,
                at(2024, 5, 2, 10),
            )),
            order("o1", PHONE, 400.0, at(2024, 5, 2, 12)),
            order("g1", "", 90.0, at(2024, 5, 2, 11)),
            load("l1", PHONE, 1000.0, LoadStatus::Confirmed),
            load("x1", "9811111111", 700.0, LoadStatus::Confirmed),
        ]
    }

    #[test]
    fn test_calculate_balance_counts_confirmed_loads_and_orders() {
        assert_eq!(calculate_balance(PHONE, &sample_log()), 450.0);
        assert_eq!(calculate_balance("9811111111", &sample_log()), 700.0);
        assert_eq!(calculate_balance("9899999999", &sample_log()), 0.0);
        assert_eq!(calculate_balance(PHONE, &[]), 0.0);
    }

    #[test]
    fn test_calculate_balance_is_order_independent() {
        let log = sample_log();
        let mut reversed = log.clone();
        reversed.reverse();
        let mut rotated = log.clone();
        rotated.rotate_left(3);

        let expected = calculate_balance(PHONE, &log);
        assert_eq!(calculate_balance(PHONE, &reversed), expected);
        assert_eq!(calculate_balance(PHONE, &rotated), expected);
    }

    #[test]
    fn test_user_ledgers_group_by_phone() {
        let mut log = sample_log();
        if let Transaction::Order(guest) = &mut log[5] {
            guest.user_phone = None;
        }
        let ledgers = user_ledgers(&log);
        assert_eq!(ledgers.len(), 3);

        let mine = ledgers.iter().find(|l| l.phone == PHONE).unwrap_or_else(|| unreachable!());
        assert_eq!(mine.balance, 450.0);
        assert_eq!(mine.total_orders, 2);
        assert_eq!(mine.last_activity, at(2024, 5, 3, 13));

        let guest = ledgers.iter().find(|l| l.phone == GUEST).unwrap_or_else(|| unreachable!());
        assert_eq!(guest.balance, -90.0);
        assert_eq!(guest.total_orders, 1);
    }

    #[test]
    fn test_user_ledgers_put_blank_phones_in_guest() {
        let mut anonymous = order("g2", "", 40.0, at(2024, 5, 4, 12));
        if let Transaction::Order(o) = &mut anonymous {
            o.user_phone = None;
        }
        let log = vec![order("g1", "", 90.0, at(2024, 5, 3, 12)), anonymous];

        let ledgers = user_ledgers(&log);
        let phones: Vec<&str> = ledgers.iter().map(|l| l.phone.as_str()).collect();
        assert_eq!(phones, vec![GUEST]);
        assert_eq!(ledgers[0].total_orders, 2);
        assert_eq!(ledgers[0].balance, -130.0);
        assert_eq!(ledgers[0].last_activity, at(2024, 5, 4, 12));
    }

    #[test]
    fn test_user_history_and_order_count() {
        let log = sample_log();
        let history = user_history(PHONE, &log);
        let ids: Vec<&str> = history.iter().map(|tx| tx.id()).collect();
        assert_eq!(ids, vec!["o2", "l2", "o1", "l1"]);
        assert_eq!(order_count(PHONE, &log), 2);
        assert_eq!(order_count("9811111111", &log), 0);
    }
}
