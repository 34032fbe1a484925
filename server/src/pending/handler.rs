//! Recovery cron endpoint.
//!
//! Triggered externally on a schedule. Authorized by a shared secret in
//! the `secret` query parameter or the `x-cron-secret` header; rejected
//! before any other processing when the secret is missing or wrong.

use axum::{
	Json,
	extract::{Query, State},
	http::HeaderMap,
};
use serde::Deserialize;

use crate::pending::worker::{RecoveryPolicy, RecoverySummary, process_due_pending};
use crate::prelude::*;

#[derive(Debug, Deserialize)]
pub struct CronQuery {
	#[serde(default)]
	pub secret: Option<String>,
}

fn is_authorized(config_secret: Option<&str>, query: &CronQuery, headers: &HeaderMap) -> bool {
	let Some(secret) = config_secret else {
		// No configured secret means the endpoint is disabled entirely.
		return false;
	};

	let query_secret = query.secret.as_deref();
	let header_secret = headers.get("x-cron-secret").and_then(|h| h.to_str().ok());

	query_secret == Some(secret) || header_secret == Some(secret)
}

/// GET /api/cron/process-pending - drain due pending emails
#[axum::debug_handler]
pub async fn get_process_pending(
	State(app): State<App>,
	Query(query): Query<CronQuery>,
	headers: HeaderMap,
) -> ClResult<Json<RecoverySummary>> {
	if !is_authorized(app.config.cron_secret.as_deref(), &query, &headers) {
		return Err(Error::Unauthorized);
	}

	let policy = RecoveryPolicy::from_config(&app.config);
	let summary = process_due_pending(&app.store, &app.transport, &policy, now()).await?;
	Ok(Json(summary))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn headers_with(value: Option<&str>) -> HeaderMap {
		let mut headers = HeaderMap::new();
		if let Some(v) = value {
			headers.insert("x-cron-secret", v.parse().unwrap());
		}
		headers
	}

	#[test]
	fn test_no_configured_secret_rejects_everything() {
		let query = CronQuery { secret: Some("anything".into()) };
		assert!(!is_authorized(None, &query, &headers_with(Some("anything"))));
	}

	#[test]
	fn test_query_secret_accepted() {
		let query = CronQuery { secret: Some("s3cret".into()) };
		assert!(is_authorized(Some("s3cret"), &query, &headers_with(None)));
	}

	#[test]
	fn test_header_secret_accepted() {
		let query = CronQuery { secret: None };
		assert!(is_authorized(Some("s3cret"), &query, &headers_with(Some("s3cret"))));
	}

	#[test]
	fn test_wrong_secret_rejected() {
		let query = CronQuery { secret: Some("nope".into()) };
		assert!(!is_authorized(Some("s3cret"), &query, &headers_with(Some("also-nope"))));
	}
}

// vim: ts=4
