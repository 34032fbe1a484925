//! Pending queue recovery: the worker that drains due rows and the
//! secret-gated cron endpoint that triggers it.

pub mod handler;
pub mod worker;

pub use worker::{RecoveryPolicy, RecoverySummary, process_due_pending};

// vim: ts=4
