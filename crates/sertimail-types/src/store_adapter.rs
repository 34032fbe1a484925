//! Persistence adapter trait and the data shapes it stores.
//!
//! One broadcast owns its recipient ledger rows and its pending queue rows.
//! The ledger is append-only: a new row is written per status transition,
//! and "latest row per (broadcast_id, email)" is the current status.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::error::ClResult;
use crate::types::{DeliveryStatus, PendingStatus, Timestamp};

/// One send campaign. Immutable after creation.
#[derive(Clone, Debug)]
pub struct Broadcast {
	pub broadcast_id: Box<str>,
	/// Sanitized at creation time.
	pub event_name: Box<str>,
	/// Sanitized at creation time.
	pub event_date: Box<str>,
	/// Raw template text. Sanitization happens at render time.
	pub caption: Box<str>,
	/// Fallback attachment for recipients without their own certificate.
	pub certificate: Vec<u8>,
	pub created_at: Timestamp,
}

#[derive(Clone, Debug)]
pub struct CreateBroadcast {
	pub event_name: String,
	pub event_date: String,
	pub caption: String,
	pub certificate: Vec<u8>,
}

/// One ledger row. Appended, never updated in place except for the
/// pending -> terminal flip driven by the recovery worker.
#[derive(Clone, Debug, Serialize)]
pub struct RecipientRow {
	#[serde(skip)]
	pub recipient_id: i64,
	#[serde(skip)]
	pub broadcast_id: Box<str>,
	pub name: Box<str>,
	pub email: Box<str>,
	pub status: DeliveryStatus,
	#[serde(rename = "sentAt")]
	pub sent_at: Option<Timestamp>,
	#[serde(rename = "createdAt")]
	pub created_at: Timestamp,
}

/// One durable unit of deferred work. Subject, html, and certificate are
/// frozen at enqueue time; the worker only transports bytes.
#[derive(Clone, Debug)]
pub struct PendingEmail {
	pub pending_id: i64,
	pub broadcast_id: Box<str>,
	pub name: Box<str>,
	pub email: Box<str>,
	pub subject: Box<str>,
	pub html: Box<str>,
	pub certificate_filename: Box<str>,
	pub certificate: Vec<u8>,
	pub status: PendingStatus,
	pub scheduled_for: Timestamp,
	pub attempts: i64,
	pub last_error: Option<Box<str>>,
	pub sent_at: Option<Timestamp>,
	pub created_at: Timestamp,
}

#[derive(Clone, Debug)]
pub struct NewPendingEmail {
	pub name: String,
	pub email: String,
	pub subject: String,
	pub html: String,
	pub certificate_filename: String,
	pub certificate: Vec<u8>,
	pub scheduled_for: Timestamp,
}

/// Reusable "from" persona for the email body signature. Copied by value
/// into each render, so later edits never change historical emails.
#[derive(Clone, Debug, Serialize)]
pub struct SenderProfile {
	#[serde(rename = "id")]
	pub profile_id: Box<str>,
	pub name: Box<str>,
	pub department: Box<str>,
	pub contact: Box<str>,
	#[serde(rename = "updatedAt")]
	pub updated_at: Timestamp,
}

#[derive(Clone, Debug)]
pub struct SenderProfileData {
	pub name: String,
	pub department: String,
	pub contact: String,
}

/// Upsert key of the single default-selection profile.
pub const DEFAULT_SENDER_PROFILE_ID: &str = "default-selection";

#[async_trait]
pub trait StoreAdapter: Debug + Send + Sync {
	// Broadcasts
	//************
	async fn create_broadcast(&self, data: CreateBroadcast) -> ClResult<Broadcast>;
	async fn read_broadcast(&self, broadcast_id: &str) -> ClResult<Broadcast>;

	// Recipient ledger
	//******************
	/// Append one ledger row for a status transition.
	async fn append_recipient(
		&self,
		broadcast_id: &str,
		name: &str,
		email: &str,
		status: DeliveryStatus,
		sent_at: Option<Timestamp>,
	) -> ClResult<()>;

	/// All ledger rows of a broadcast, oldest first.
	async fn list_recipients(&self, broadcast_id: &str) -> ClResult<Vec<RecipientRow>>;

	/// Flip every still-pending ledger row of (broadcast_id, email) to the
	/// given terminal status. Rows already terminal are left untouched.
	async fn resolve_pending_recipient(
		&self,
		broadcast_id: &str,
		email: &str,
		status: DeliveryStatus,
		sent_at: Option<Timestamp>,
	) -> ClResult<()>;

	// Pending queue
	//***************
	async fn create_pending_emails(
		&self,
		broadcast_id: &str,
		rows: Vec<NewPendingEmail>,
	) -> ClResult<()>;

	/// Pending rows with `scheduled_for <= now`, oldest created first,
	/// capped at `limit`.
	async fn list_due_pending(&self, now: Timestamp, limit: u32) -> ClResult<Vec<PendingEmail>>;

	/// Terminal success: status=sent, attempts+1, last_error cleared.
	async fn mark_pending_sent(&self, pending_id: i64, sent_at: Timestamp) -> ClResult<()>;

	/// Failed attempt below the retry bound: stays pending, rescheduled.
	async fn mark_pending_retry(
		&self,
		pending_id: i64,
		attempts: i64,
		last_error: &str,
		scheduled_for: Timestamp,
	) -> ClResult<()>;

	/// Failed attempt at the retry bound: frozen as permanently failed,
	/// scheduled_for left unchanged.
	async fn mark_pending_failed(
		&self,
		pending_id: i64,
		attempts: i64,
		last_error: &str,
	) -> ClResult<()>;

	// Sender profiles
	//*****************
	/// Newest updated first.
	async fn list_sender_profiles(&self) -> ClResult<Vec<SenderProfile>>;
	async fn upsert_default_sender_profile(
		&self,
		data: &SenderProfileData,
	) -> ClResult<SenderProfile>;
	async fn create_sender_profile(&self, data: &SenderProfileData) -> ClResult<SenderProfile>;
	async fn delete_sender_profile(&self, profile_id: &str) -> ClResult<()>;
}

// vim: ts=4
