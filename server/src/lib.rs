//! Sertimail broadcasts personalized event-certificate emails.
//!
//! # Features
//!
//! - Certificate image analysis via a pluggable vision adapter
//! - Deterministic caption templating with placeholder aliases
//! - Immediate-send / pending-queue split that respects provider
//!   daily sending limits
//! - Secret-gated recovery cron that drains the pending queue with
//!   bounded retries
//! - Append-only per-recipient delivery ledger

#![forbid(unsafe_code)]

pub mod analyze;
pub mod broadcast;
pub mod certificate;
pub mod config;
pub mod core;
pub mod email;
pub mod pending;
pub mod prelude;
pub mod routes;
pub mod sender;
pub mod template;

pub use crate::config::Config;
pub use crate::core::app::{App, AppBuilder, AppState};

// vim: ts=4
