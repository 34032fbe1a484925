//! Database schema initialization
//!
//! Creates tables and indexes on startup. All timestamps are unixepoch
//! seconds, statuses are one-character codes.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Broadcasts
	//************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS broadcasts (
		broadcast_id text NOT NULL,
		event_name text NOT NULL,
		event_date text NOT NULL,
		caption text NOT NULL,
		certificate blob NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(broadcast_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Recipient ledger
	//******************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS recipients (
		recipient_id integer PRIMARY KEY AUTOINCREMENT,
		broadcast_id text NOT NULL,
		name text NOT NULL,
		email text NOT NULL,
		status char(1) NOT NULL,		-- 'S' - success, 'F' - failed, 'P' - pending
		sent_at datetime,
		created_at datetime DEFAULT (unixepoch())
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_recipients_broadcast ON recipients(broadcast_id, email)",
	)
	.execute(&mut *tx)
	.await?;

	// Pending queue
	//***************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS pending_emails (
		pending_id integer PRIMARY KEY AUTOINCREMENT,
		broadcast_id text NOT NULL,
		name text NOT NULL,
		email text NOT NULL,
		subject text NOT NULL,
		html text NOT NULL,
		certificate_filename text NOT NULL,
		certificate blob NOT NULL,
		status char(1) NOT NULL DEFAULT 'P',	-- 'P' - pending, 'S' - sent, 'F' - failed
		scheduled_for datetime NOT NULL,
		attempts integer NOT NULL DEFAULT 0,
		last_error text,
		sent_at datetime,
		created_at datetime DEFAULT (unixepoch())
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_pending_due ON pending_emails(scheduled_for, created_at)
		WHERE status='P'",
	)
	.execute(&mut *tx)
	.await?;

	// Sender profiles
	//*****************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS sender_profiles (
		profile_id text NOT NULL,
		name text NOT NULL,
		department text NOT NULL,
		contact text NOT NULL,
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(profile_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
