//! Error type shared by the server and the adapters.

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Batch-level input rejection. Nothing is persisted or sent.
	ValidationError(String),
	/// Broken or missing configuration (settings, secrets, SMTP block).
	ConfigError(String),
	/// A collaborator (SMTP relay, vision service, file store) is not usable.
	ServiceUnavailable(String),
	/// The caller exceeded its own action quota. Carries a retry hint.
	RateLimited(String),
	PermissionDenied,
	Unauthorized,
	NotFound,
	DbError,
	Timeout,
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "config error: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::RateLimited(msg) => write!(f, "rate limited: {}", msg),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::NotFound => write!(f, "not found"),
			Error::DbError => write!(f, "database error"),
			Error::Timeout => write!(f, "timeout"),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, code, message) = match self {
			Error::ValidationError(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg),
			Error::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG", msg),
			Error::ServiceUnavailable(msg) => {
				(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
			}
			Error::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", msg),
			Error::PermissionDenied => {
				(StatusCode::FORBIDDEN, "PERMISSION_DENIED", "permission denied".into())
			}
			Error::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "unauthorized".into()),
			Error::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "not found".into()),
			Error::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", "timeout".into()),
			_ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error".into()),
		};
		(status, Json(serde_json::json!({ "error": code, "message": message }))).into_response()
	}
}

// vim: ts=4
