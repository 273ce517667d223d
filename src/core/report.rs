//! Dashboard reports.
//!
//! This module provides the daily profit rollup, the filtered lists the staff
//! dashboard shows, and the text formatting for amounts. All functions are pure and
//! re-derivable from the transaction log at any time.

use crate::models::{
    BalanceLoad, LoadStatus, Order, PurchaseBill, ServiceRequest, ServiceStatus, Transaction,
};
use chrono::{Local, NaiveDate, TimeZone};
use std::collections::BTreeMap;

/// Revenue and spending of one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProfit {
    /// Calendar day in the reporting time zone
    pub date: NaiveDate,
    /// Sum of order totals
    pub revenue: f64,
    /// Sum of expense amounts
    pub expenses: f64,
    /// `revenue - expenses`
    pub profit: f64,
}

/// Sums across every reported day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfitTotals {
    /// Total revenue
    pub revenue: f64,
    /// Total expenses
    pub expenses: f64,
    /// Total profit
    pub profit: f64,
}

/// Groups orders and expenses by calendar day in `tz`, newest day first.
///
/// Loads and service requests are not revenue and are skipped. Grouping does not
/// depend on the order of `transactions`.
#[must_use]
pub fn daily_profit<Tz: TimeZone>(transactions: &[Transaction], tz: &Tz) -> Vec<DailyProfit> {
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for tx in transactions {
        let (revenue, expense) = match tx {
            Transaction::Order(order) => (order.total_price, 0.0),
            Transaction::Expense(bill) => (0.0, bill.amount),
            Transaction::Load(_) | Transaction::Service(_) => continue,
        };
        let date = tx.created().with_timezone(tz).date_naive();
        let day = days.entry(date).or_insert((0.0, 0.0));
        day.0 += revenue;
        day.1 += expense;
    }

    days.into_iter()
        .rev()
        .map(|(date, (revenue, expenses))| DailyProfit {
            date,
            revenue,
            expenses,
            profit: revenue - expenses,
        })
        .collect()
}

/// [`daily_profit`] in the machine's local time zone.
#[must_use]
pub fn daily_profit_local(transactions: &[Transaction]) -> Vec<DailyProfit> {
    daily_profit(transactions, &Local)
}

/// Adds up a set of daily rows.
#[must_use]
pub fn profit_totals(days: &[DailyProfit]) -> ProfitTotals {
    days.iter().fold(ProfitTotals::default(), |acc, day| ProfitTotals {
        revenue: acc.revenue + day.revenue,
        expenses: acc.expenses + day.expenses,
        profit: acc.profit + day.profit,
    })
}

/// Every order in the log, newest first.
#[must_use]
pub fn orders(transactions: &[Transaction]) -> Vec<&Order> {
    transactions
        .iter()
        .filter_map(|tx| match tx {
            Transaction::Order(order) => Some(order),
            _ => None,
        })
        .collect()
}

/// Every expense in the log, newest first.
#[must_use]
pub fn expenses(transactions: &[Transaction]) -> Vec<&PurchaseBill> {
    transactions
        .iter()
        .filter_map(|tx| match tx {
            Transaction::Expense(bill) => Some(bill),
            _ => None,
        })
        .collect()
}

/// Service requests still waiting for staff.
#[must_use]
pub fn pending_service_requests(transactions: &[Transaction]) -> Vec<&ServiceRequest> {
    transactions
        .iter()
        .filter_map(|tx| match tx {
            Transaction::Service(request) if request.status == ServiceStatus::Pending => {
                Some(request)
            }
            _ => None,
        })
        .collect()
}

/// Wallet loads still waiting for confirmation.
#[must_use]
pub fn pending_loads(transactions: &[Transaction]) -> Vec<&BalanceLoad> {
    transactions
        .iter()
        .filter_map(|tx| match tx {
            Transaction::Load(load) if load.status == LoadStatus::Pending => Some(load),
            _ => None,
        })
        .collect()
}

/// Formats a rupee amount the way the app shows it, e.g. `"Nrs. 1000"` or `"Nrs. 12.5"`.
///
/// Whole amounts print without decimals; fractional ones print as entered.
#[must_use]
pub fn format_rupees(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("Nrs. {amount:.0}")
    } else {
        format!("Nrs. {amount}")
    }
}

/// Formats a wallet movement with its sign, e.g. `"+Nrs. 500"` or `"-Nrs. 400"`.
#[must_use]
pub fn format_wallet_delta(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+{}", format_rupees(amount))
    } else {
        format!("-{}", format_rupees(amount.abs()))
    }
}

/// One-line description of a log entry for the dashboard.
#[must_use]
pub fn format_transaction_summary(tx: &Transaction) -> String {
    match tx {
        Transaction::Order(order) => format!(
            "{} | order | {} | {}",
            format_wallet_delta(-order.total_price),
            order.status,
            if order.is_paid { "paid" } else { "unpaid" }
        ),
        Transaction::Load(load) => format!(
            "{} | load | {:?}",
            format_wallet_delta(load.amount),
            load.status
        ),
        Transaction::Expense(bill) => format!(
            "{} | expense | {} | {}",
            format_rupees(bill.amount),
            bill.supplier,
            bill.description
        ),
        Transaction::Service(request) => {
            format!("service | {:?} | {:?}", request.sub_type, request.status)
        }
    }
}
