//! Broadcast session: validation, the immediate/pending dispatcher, the
//! delivery ledger read model, and the HTTP handlers on top of them.

pub mod dispatcher;
pub mod handler;
pub mod ledger;
pub mod validate;

pub use dispatcher::{BroadcastInput, DispatchPolicy, Dispatcher, RecipientInput, SendOutcome};

// vim: ts=4
