//! Outgoing email: SMTP delivery via lettre.
//!
//! The transport trait itself lives in `sertimail-types`; this module holds
//! the production SMTP implementation.

pub mod sender;

pub use sender::SmtpEmailSender;

// vim: ts=4
