//! Certificate image analysis endpoint.
//!
//! Delegates to the injected vision analyzer. A failed analysis is a
//! user-visible error; the operator re-uploads rather than the server
//! retrying the inference call.

use axum::{Json, extract::Multipart, extract::State};

use sertimail_types::vision::CertificateAnalysis;

use crate::core::extract::Auth;
use crate::core::rate_limit::{ANALYZE_QUOTA, enforce};
use crate::prelude::*;

/// POST /api/analyze - extract recipient/event metadata and a draft caption
#[axum::debug_handler]
pub async fn post_analyze(
	State(app): State<App>,
	Auth(identity): Auth,
	mut multipart: Multipart,
) -> ClResult<Json<CertificateAnalysis>> {
	enforce(app.quota.as_ref(), &identity.operator, &ANALYZE_QUOTA)?;

	let Some(vision) = &app.vision else {
		return Err(Error::ServiceUnavailable("No vision analyzer configured".into()));
	};

	let mut image: Option<Vec<u8>> = None;
	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|e| Error::ValidationError(format!("Bad multipart body: {}", e)))?
	{
		if field.name() == Some("certificate") {
			let bytes = field
				.bytes()
				.await
				.map_err(|e| Error::ValidationError(format!("Bad certificate upload: {}", e)))?;
			image = Some(bytes.to_vec());
		}
	}

	let image =
		image.ok_or_else(|| Error::ValidationError("No certificate file provided".into()))?;

	let analysis = vision.analyze_certificate(&image).await?;
	info!(operator = %identity.operator, event = %analysis.event_name, "Certificate analyzed");

	Ok(Json(analysis))
}

// vim: ts=4
