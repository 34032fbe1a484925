//! Sender profile handlers.
//!
//! Profiles are copied by value into each broadcast render, so editing or
//! deleting one never changes historical emails.

use axum::{
	Json,
	extract::{Path, State},
};
use serde::Deserialize;

use sertimail_types::store_adapter::{SenderProfile, SenderProfileData};

use crate::broadcast::validate::MAX_SENDER_FIELD_LEN;
use crate::core::extract::Auth;
use crate::prelude::*;

#[derive(Debug, Deserialize)]
pub struct SenderProfileRequest {
	pub name: String,
	pub department: String,
	#[serde(default)]
	pub contact: String,
}

fn into_data(request: SenderProfileRequest) -> ClResult<SenderProfileData> {
	let data = SenderProfileData {
		name: request.name.trim().to_string(),
		department: request.department.trim().to_string(),
		contact: request.contact.trim().to_string(),
	};

	if data.name.is_empty() {
		return Err(Error::ValidationError("Sender name is required".into()));
	}
	if data.department.is_empty() {
		return Err(Error::ValidationError("Sender department is required".into()));
	}
	if data.name.len() > MAX_SENDER_FIELD_LEN
		|| data.department.len() > MAX_SENDER_FIELD_LEN
		|| data.contact.len() > MAX_SENDER_FIELD_LEN
	{
		return Err(Error::ValidationError("Sender field too long".into()));
	}
	Ok(data)
}

/// GET /api/sender - list profiles, newest updated first
#[axum::debug_handler]
pub async fn get_sender_profiles(
	State(app): State<App>,
	Auth(_identity): Auth,
) -> ClResult<Json<Vec<SenderProfile>>> {
	Ok(Json(app.store.list_sender_profiles().await?))
}

/// POST /api/sender - save the default-selection profile
#[axum::debug_handler]
pub async fn post_sender_profile(
	State(app): State<App>,
	Auth(_identity): Auth,
	Json(request): Json<SenderProfileRequest>,
) -> ClResult<Json<SenderProfile>> {
	let data = into_data(request)?;
	Ok(Json(app.store.upsert_default_sender_profile(&data).await?))
}

/// POST /api/sender/new - create an additional named profile
#[axum::debug_handler]
pub async fn post_new_sender_profile(
	State(app): State<App>,
	Auth(_identity): Auth,
	Json(request): Json<SenderProfileRequest>,
) -> ClResult<Json<SenderProfile>> {
	let data = into_data(request)?;
	Ok(Json(app.store.create_sender_profile(&data).await?))
}

/// DELETE /api/sender/{id}
#[axum::debug_handler]
pub async fn delete_sender_profile(
	State(app): State<App>,
	Auth(_identity): Auth,
	Path(profile_id): Path<String>,
) -> ClResult<Json<serde_json::Value>> {
	app.store.delete_sender_profile(&profile_id).await?;
	Ok(Json(serde_json::json!({ "deleted": true })))
}


// vim: ts=4
