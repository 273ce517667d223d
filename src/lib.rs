//! `floyds-orders` - ordering core for a single-restaurant storefront
//!
//! This crate holds the state machine behind the storefront: a pure reducer over
//! one session state, the derivations built on its transaction log (wallet
//! balances, daily profit, per-customer ledgers), the dispatchers that turn user
//! intents into transitions, and a persistence layer that mirrors state to a
//! local `SQLite` store and, best-effort, to a remote HTTP store.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Documentation - missing docs should be added gradually
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_types_passed_by_value,
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Complexity and readability
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::too_many_lines,

    // Style consistency
    clippy::enum_glob_use,
    clippy::inconsistent_struct_constructor,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Configuration management for storage, remote API, and background loops
pub mod config;
/// Core business logic - reducer, balance and profit derivations
pub mod core;
/// SeaORM entity definitions for the local store
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Menu, cart, transaction, and session state structures
pub mod models;
/// Remote mirror and local durable store
pub mod persistence;
/// Session state container and use-case dispatchers
pub mod session;
/// Order progression and opening-hours loops
pub mod timers;

#[cfg(test)]
pub mod test_utils;
