//! Broadcast persistence

use sqlx::{Row, SqlitePool};

use sertimail::prelude::*;
use sertimail::store_adapter::{Broadcast, CreateBroadcast};
use sertimail::utils::random_id;

use crate::utils::*;

pub(crate) async fn create(db: &SqlitePool, data: CreateBroadcast) -> ClResult<Broadcast> {
	let broadcast_id = random_id();
	let created_at = now();

	sqlx::query(
		"INSERT INTO broadcasts (broadcast_id, event_name, event_date, caption, certificate, created_at)
		VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(&broadcast_id)
	.bind(&data.event_name)
	.bind(&data.event_date)
	.bind(&data.caption)
	.bind(&data.certificate)
	.bind(created_at.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(Broadcast {
		broadcast_id: broadcast_id.into(),
		event_name: data.event_name.into(),
		event_date: data.event_date.into(),
		caption: data.caption.into(),
		certificate: data.certificate,
		created_at,
	})
}

pub(crate) async fn read(db: &SqlitePool, broadcast_id: &str) -> ClResult<Broadcast> {
	let res = sqlx::query(
		"SELECT broadcast_id, event_name, event_date, caption, certificate, created_at
		FROM broadcasts WHERE broadcast_id = ?",
	)
	.bind(broadcast_id)
	.fetch_one(db)
	.await;

	map_res(res, |row| {
		Ok(Broadcast {
			broadcast_id: row.try_get::<String, _>("broadcast_id")?.into(),
			event_name: row.try_get::<String, _>("event_name")?.into(),
			event_date: row.try_get::<String, _>("event_date")?.into(),
			caption: row.try_get::<String, _>("caption")?.into(),
			certificate: row.try_get("certificate")?,
			created_at: row.try_get("created_at").map(Timestamp)?,
		})
	})
}

// vim: ts=4
