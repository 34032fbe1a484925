const TOKEN_EXPIRE: u64 = 8; /* hours */

use axum::{
	body::Body,
	extract::State,
	http::{Request, response::Response},
	middleware::Next,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::time;

use crate::prelude::*;

/// Authenticated operator, attached to request extensions by `require_auth`.
#[derive(Clone, Debug)]
pub struct AuthIdentity {
	/// Operator id (usually an email); also the rate-limit key.
	pub operator: Box<str>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct AuthToken {
	sub: String,
	exp: u64,
}

pub fn generate_access_token(secret: &str, operator: &str) -> ClResult<String> {
	let expire = time::SystemTime::now()
		.duration_since(time::UNIX_EPOCH)
		.map_err(|_| Error::PermissionDenied)?
		.as_secs() + 3600 * TOKEN_EXPIRE;

	let token = jsonwebtoken::encode(
		&jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
		&AuthToken { sub: operator.into(), exp: expire },
		&jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
	)
	.map_err(|_| Error::PermissionDenied)?;

	Ok(token)
}

fn validate_token(secret: &str, token: &str) -> ClResult<AuthIdentity> {
	let decoding_key = DecodingKey::from_secret(secret.as_bytes());

	let token_data =
		decode::<AuthToken>(token, &decoding_key, &Validation::new(Algorithm::HS256))
			.map_err(|_| Error::Unauthorized)?;

	Ok(AuthIdentity { operator: token_data.claims.sub.into() })
}

pub async fn require_auth(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> ClResult<Response<Body>> {
	let auth_header = req
		.headers()
		.get("Authorization")
		.and_then(|h| h.to_str().ok())
		.ok_or(Error::Unauthorized)?;

	let token = auth_header.strip_prefix("Bearer ").ok_or(Error::Unauthorized)?;
	let identity = validate_token(&app.config.auth_secret, token)?;

	req.extensions_mut().insert(identity);

	Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_token_round_trip() {
		let token = generate_access_token("test-secret", "ops@example.com").unwrap();
		let identity = validate_token("test-secret", &token).unwrap();
		assert_eq!(&*identity.operator, "ops@example.com");
	}

	#[test]
	fn test_token_rejected_with_wrong_secret() {
		let token = generate_access_token("test-secret", "ops@example.com").unwrap();
		assert!(validate_token("other-secret", &token).is_err());
	}

	#[test]
	fn test_garbage_token_rejected() {
		assert!(validate_token("test-secret", "not.a.token").is_err());
	}
}

// vim: ts=4
