//! SQLite store adapter for Sertimail.
//!
//! Persists broadcasts, the append-only recipient ledger, the pending email
//! queue, and sender profiles in a single WAL-mode SQLite database.

use async_trait::async_trait;
use std::path::Path;

use sqlx::sqlite::{self, SqlitePool};

use sertimail::prelude::*;
use sertimail::store_adapter::{
	Broadcast, CreateBroadcast, NewPendingEmail, PendingEmail, RecipientRow, SenderProfile,
	SenderProfileData, StoreAdapter,
};

mod broadcast;
mod pending;
mod recipient;
mod schema;
mod sender_profile;
mod utils;

use schema::init_db;

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		init_db(&db)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl StoreAdapter for StoreAdapterSqlite {
	// Broadcasts
	//************
	async fn create_broadcast(&self, data: CreateBroadcast) -> ClResult<Broadcast> {
		broadcast::create(&self.db, data).await
	}

	async fn read_broadcast(&self, broadcast_id: &str) -> ClResult<Broadcast> {
		broadcast::read(&self.db, broadcast_id).await
	}

	// Recipient ledger
	//******************
	async fn append_recipient(
		&self,
		broadcast_id: &str,
		name: &str,
		email: &str,
		status: DeliveryStatus,
		sent_at: Option<Timestamp>,
	) -> ClResult<()> {
		recipient::append(&self.db, broadcast_id, name, email, status, sent_at).await
	}

	async fn list_recipients(&self, broadcast_id: &str) -> ClResult<Vec<RecipientRow>> {
		recipient::list(&self.db, broadcast_id).await
	}

	async fn resolve_pending_recipient(
		&self,
		broadcast_id: &str,
		email: &str,
		status: DeliveryStatus,
		sent_at: Option<Timestamp>,
	) -> ClResult<()> {
		recipient::resolve_pending(&self.db, broadcast_id, email, status, sent_at).await
	}

	// Pending queue
	//***************
	async fn create_pending_emails(
		&self,
		broadcast_id: &str,
		rows: Vec<NewPendingEmail>,
	) -> ClResult<()> {
		pending::create_many(&self.db, broadcast_id, rows).await
	}

	async fn list_due_pending(&self, now: Timestamp, limit: u32) -> ClResult<Vec<PendingEmail>> {
		pending::list_due(&self.db, now, limit).await
	}

	async fn mark_pending_sent(&self, pending_id: i64, sent_at: Timestamp) -> ClResult<()> {
		pending::mark_sent(&self.db, pending_id, sent_at).await
	}

	async fn mark_pending_retry(
		&self,
		pending_id: i64,
		attempts: i64,
		last_error: &str,
		scheduled_for: Timestamp,
	) -> ClResult<()> {
		pending::mark_retry(&self.db, pending_id, attempts, last_error, scheduled_for).await
	}

	async fn mark_pending_failed(
		&self,
		pending_id: i64,
		attempts: i64,
		last_error: &str,
	) -> ClResult<()> {
		pending::mark_failed(&self.db, pending_id, attempts, last_error).await
	}

	// Sender profiles
	//*****************
	async fn list_sender_profiles(&self) -> ClResult<Vec<SenderProfile>> {
		sender_profile::list(&self.db).await
	}

	async fn upsert_default_sender_profile(
		&self,
		data: &SenderProfileData,
	) -> ClResult<SenderProfile> {
		sender_profile::upsert_default(&self.db, data).await
	}

	async fn create_sender_profile(&self, data: &SenderProfileData) -> ClResult<SenderProfile> {
		sender_profile::create(&self.db, data).await
	}

	async fn delete_sender_profile(&self, profile_id: &str) -> ClResult<()> {
		sender_profile::delete(&self.db, profile_id).await
	}
}

// vim: ts=4
