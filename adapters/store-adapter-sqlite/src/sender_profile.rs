//! Sender profile persistence

use sqlx::{Row, SqlitePool};

use sertimail::prelude::*;
use sertimail::store_adapter::{DEFAULT_SENDER_PROFILE_ID, SenderProfile, SenderProfileData};
use sertimail::utils::random_id;

use crate::utils::*;

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<SenderProfile, sqlx::Error> {
	Ok(SenderProfile {
		profile_id: row.try_get::<String, _>("profile_id")?.into(),
		name: row.try_get::<String, _>("name")?.into(),
		department: row.try_get::<String, _>("department")?.into(),
		contact: row.try_get::<String, _>("contact")?.into(),
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<SenderProfile>> {
	let res = sqlx::query(
		"SELECT profile_id, name, department, contact, updated_at
		FROM sender_profiles ORDER BY updated_at DESC",
	)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(map_row))
}

pub(crate) async fn upsert_default(
	db: &SqlitePool,
	data: &SenderProfileData,
) -> ClResult<SenderProfile> {
	let updated_at = now();

	sqlx::query(
		"INSERT INTO sender_profiles (profile_id, name, department, contact, updated_at)
		VALUES (?, ?, ?, ?, ?)
		ON CONFLICT(profile_id) DO UPDATE SET
			name=excluded.name, department=excluded.department,
			contact=excluded.contact, updated_at=excluded.updated_at",
	)
	.bind(DEFAULT_SENDER_PROFILE_ID)
	.bind(&data.name)
	.bind(&data.department)
	.bind(&data.contact)
	.bind(updated_at.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(SenderProfile {
		profile_id: DEFAULT_SENDER_PROFILE_ID.into(),
		name: data.name.clone().into(),
		department: data.department.clone().into(),
		contact: data.contact.clone().into(),
		updated_at,
	})
}

pub(crate) async fn create(db: &SqlitePool, data: &SenderProfileData) -> ClResult<SenderProfile> {
	let profile_id = random_id();
	let updated_at = now();

	sqlx::query(
		"INSERT INTO sender_profiles (profile_id, name, department, contact, updated_at)
		VALUES (?, ?, ?, ?, ?)",
	)
	.bind(&profile_id)
	.bind(&data.name)
	.bind(&data.department)
	.bind(&data.contact)
	.bind(updated_at.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(SenderProfile {
		profile_id: profile_id.into(),
		name: data.name.clone().into(),
		department: data.department.clone().into(),
		contact: data.contact.clone().into(),
		updated_at,
	})
}

pub(crate) async fn delete(db: &SqlitePool, profile_id: &str) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM sender_profiles WHERE profile_id=?")
		.bind(profile_id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

// vim: ts=4
