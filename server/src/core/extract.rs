//! Custom Axum extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::core::route_auth::AuthIdentity;
use crate::prelude::*;

/// Extracts the operator identity set by the `require_auth` middleware.
pub struct Auth(pub AuthIdentity);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<AuthIdentity>()
			.cloned()
			.map(Auth)
			.ok_or(Error::Unauthorized)
	}
}

// vim: ts=4
