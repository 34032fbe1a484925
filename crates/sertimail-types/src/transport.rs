//! Email transport trait.
//!
//! The dispatcher and the recovery worker only see this seam; the SMTP
//! implementation lives in the server crate, mocks live in the tests.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ClResult;

#[derive(Clone, Debug)]
pub struct Attachment {
	pub filename: String,
	pub content: Vec<u8>,
}

/// One fully-rendered outgoing message.
#[derive(Clone, Debug)]
pub struct OutgoingEmail {
	pub to: String,
	pub subject: String,
	pub html: String,
	pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait EmailTransport: Debug + Send + Sync {
	/// Deliver one message. Failure means this message only; callers decide
	/// whether to record, retry, or continue.
	async fn send(&self, email: &OutgoingEmail) -> ClResult<()>;
}

// vim: ts=4
