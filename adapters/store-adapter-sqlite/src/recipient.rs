//! Recipient ledger persistence
//!
//! Rows are appended per status transition. The only in-place update is the
//! pending -> terminal flip, guarded by status='P' so terminal rows are
//! never rewritten.

use sqlx::{Row, SqlitePool};

use sertimail::prelude::*;
use sertimail::store_adapter::RecipientRow;

use crate::utils::*;

pub(crate) async fn append(
	db: &SqlitePool,
	broadcast_id: &str,
	name: &str,
	email: &str,
	status: DeliveryStatus,
	sent_at: Option<Timestamp>,
) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO recipients (broadcast_id, name, email, status, sent_at, created_at)
		VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(broadcast_id)
	.bind(name)
	.bind(email)
	.bind(status.as_code().to_string())
	.bind(sent_at.map(|t| t.0))
	.bind(now().0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(())
}

pub(crate) async fn list(db: &SqlitePool, broadcast_id: &str) -> ClResult<Vec<RecipientRow>> {
	let res = sqlx::query(
		"SELECT recipient_id, broadcast_id, name, email, status, sent_at, created_at
		FROM recipients WHERE broadcast_id = ?
		ORDER BY recipient_id",
	)
	.bind(broadcast_id)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(|row| {
		Ok(RecipientRow {
			recipient_id: row.try_get("recipient_id")?,
			broadcast_id: row.try_get::<String, _>("broadcast_id")?.into(),
			name: row.try_get::<String, _>("name")?.into(),
			email: row.try_get::<String, _>("email")?.into(),
			status: DeliveryStatus::from_code(status_code(row, "status")?)
				.unwrap_or(DeliveryStatus::Failed),
			sent_at: row.try_get::<Option<i64>, _>("sent_at")?.map(Timestamp),
			created_at: row.try_get("created_at").map(Timestamp)?,
		})
	}))
}

pub(crate) async fn resolve_pending(
	db: &SqlitePool,
	broadcast_id: &str,
	email: &str,
	status: DeliveryStatus,
	sent_at: Option<Timestamp>,
) -> ClResult<()> {
	sqlx::query(
		"UPDATE recipients SET status=?, sent_at=?
		WHERE broadcast_id=? AND email=? AND status='P'",
	)
	.bind(status.as_code().to_string())
	.bind(sent_at.map(|t| t.0))
	.bind(broadcast_id)
	.bind(email)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(())
}

// vim: ts=4
