//! Pending queue persistence
//!
//! Every mutation is guarded by status='P'; a row already moved to a
//! terminal state by a concurrent worker pass no longer matches, which is
//! what bounds duplicate work under overlapping invocations.

use sqlx::{Row, SqlitePool};

use sertimail::prelude::*;
use sertimail::store_adapter::{NewPendingEmail, PendingEmail};

use crate::utils::*;

pub(crate) async fn create_many(
	db: &SqlitePool,
	broadcast_id: &str,
	rows: Vec<NewPendingEmail>,
) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(|_| Error::DbError)?;
	let created_at = now();

	for row in rows {
		sqlx::query(
			"INSERT INTO pending_emails (broadcast_id, name, email, subject, html,
			certificate_filename, certificate, status, scheduled_for, attempts, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, 'P', ?, 0, ?)",
		)
		.bind(broadcast_id)
		.bind(&row.name)
		.bind(&row.email)
		.bind(&row.subject)
		.bind(&row.html)
		.bind(&row.certificate_filename)
		.bind(&row.certificate)
		.bind(row.scheduled_for.0)
		.bind(created_at.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	}
	tx.commit().await.map_err(|_| Error::DbError)?;

	Ok(())
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<PendingEmail, sqlx::Error> {
	Ok(PendingEmail {
		pending_id: row.try_get("pending_id")?,
		broadcast_id: row.try_get::<String, _>("broadcast_id")?.into(),
		name: row.try_get::<String, _>("name")?.into(),
		email: row.try_get::<String, _>("email")?.into(),
		subject: row.try_get::<String, _>("subject")?.into(),
		html: row.try_get::<String, _>("html")?.into(),
		certificate_filename: row.try_get::<String, _>("certificate_filename")?.into(),
		certificate: row.try_get("certificate")?,
		status: PendingStatus::from_code(status_code(row, "status")?)
			.unwrap_or(PendingStatus::Failed),
		scheduled_for: row.try_get("scheduled_for").map(Timestamp)?,
		attempts: row.try_get("attempts")?,
		last_error: row.try_get::<Option<String>, _>("last_error")?.map(Into::into),
		sent_at: row.try_get::<Option<i64>, _>("sent_at")?.map(Timestamp),
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn list_due(
	db: &SqlitePool,
	now: Timestamp,
	limit: u32,
) -> ClResult<Vec<PendingEmail>> {
	let res = sqlx::query(
		"SELECT pending_id, broadcast_id, name, email, subject, html, certificate_filename,
		certificate, status, scheduled_for, attempts, last_error, sent_at, created_at
		FROM pending_emails
		WHERE status='P' AND scheduled_for <= ?
		ORDER BY created_at, pending_id
		LIMIT ?",
	)
	.bind(now.0)
	.bind(i64::from(limit))
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(map_row))
}

pub(crate) async fn mark_sent(db: &SqlitePool, pending_id: i64, sent_at: Timestamp) -> ClResult<()> {
	sqlx::query(
		"UPDATE pending_emails SET status='S', sent_at=?, attempts=attempts+1, last_error=NULL
		WHERE pending_id=? AND status='P'",
	)
	.bind(sent_at.0)
	.bind(pending_id)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(())
}

pub(crate) async fn mark_retry(
	db: &SqlitePool,
	pending_id: i64,
	attempts: i64,
	last_error: &str,
	scheduled_for: Timestamp,
) -> ClResult<()> {
	sqlx::query(
		"UPDATE pending_emails SET attempts=?, last_error=?, scheduled_for=?
		WHERE pending_id=? AND status='P'",
	)
	.bind(attempts)
	.bind(last_error)
	.bind(scheduled_for.0)
	.bind(pending_id)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(())
}

pub(crate) async fn mark_failed(
	db: &SqlitePool,
	pending_id: i64,
	attempts: i64,
	last_error: &str,
) -> ClResult<()> {
	// scheduled_for is deliberately left frozen on the terminal failure
	sqlx::query(
		"UPDATE pending_emails SET attempts=?, last_error=?, status='F'
		WHERE pending_id=? AND status='P'",
	)
	.bind(attempts)
	.bind(last_error)
	.bind(pending_id)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(())
}

// vim: ts=4
