//! Core business logic - framework-agnostic state machine and derivations.

/// Balance and per-customer ledger derivations
pub mod ledger;
/// The pure state transition function
pub mod reducer;
/// Daily profit rollup, dashboard lists, and amount formatting
pub mod report;

pub use ledger::calculate_balance;
pub use reducer::{Action, reduce};
