//! Broadcast HTTP handlers

use axum::{
	Json,
	extract::{Path, State},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use sertimail_types::transport::{Attachment, OutgoingEmail};

use crate::broadcast::dispatcher::{BroadcastInput, Dispatcher, RecipientInput, SendOutcome};
use crate::broadcast::{ledger, validate};
use crate::certificate::{self, attachment_filename};
use crate::core::extract::Auth;
use crate::core::rate_limit::{ANALYZE_QUOTA, BROADCAST_QUOTA, enforce};
use crate::prelude::*;
use crate::template::{RenderInput, SenderIdentity};

#[derive(Debug, Deserialize)]
pub struct RecipientDto {
	pub name: String,
	pub email: String,
	/// Base64-encoded per-recipient certificate bytes.
	#[serde(default)]
	pub certificate: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
	pub recipients: Vec<RecipientDto>,
	/// Base64-encoded fallback certificate bytes.
	#[serde(default)]
	pub default_certificate: Option<String>,
	pub caption: String,
	pub event_name: String,
	pub event_date: String,
	pub sender: SenderIdentity,
	#[serde(default)]
	pub youtube_url: Option<String>,
	/// Fill missing per-recipient certificates from the configured
	/// certificate folder before dispatching.
	#[serde(default)]
	pub use_certificate_folder: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
	pub broadcast_id: String,
	pub results: Vec<SendOutcome>,
}

fn decode_certificate(field: &str, value: Option<&str>) -> ClResult<Option<Vec<u8>>> {
	match value {
		Some(encoded) if !encoded.is_empty() => BASE64
			.decode(encoded)
			.map(Some)
			.map_err(|_| Error::ValidationError(format!("Invalid base64 in {}", field))),
		_ => Ok(None),
	}
}

async fn into_input(app: &App, request: BroadcastRequest) -> ClResult<BroadcastInput> {
	let mut recipients = Vec::with_capacity(request.recipients.len());
	for dto in request.recipients {
		recipients.push(RecipientInput {
			certificate: decode_certificate("recipient certificate", dto.certificate.as_deref())?,
			name: dto.name,
			email: dto.email,
		});
	}

	// Fill missing certificates from the local folder match, when asked to.
	if request.use_certificate_folder {
		if let Some(cert_store) = &app.cert_store {
			let unresolved: Vec<String> = recipients
				.iter()
				.filter(|r| r.certificate.is_none())
				.map(|r| r.name.clone())
				.collect();
			let timeout = Duration::from_millis(app.config.cert_lookup_timeout_ms);
			let resolved =
				certificate::resolve_for_recipients(cert_store.as_ref(), &unresolved, timeout)
					.await;

			let mut resolved_iter = resolved.into_iter();
			for recipient in recipients.iter_mut().filter(|r| r.certificate.is_none()) {
				recipient.certificate = resolved_iter.next().flatten();
			}
		}
	}

	Ok(BroadcastInput {
		recipients,
		default_certificate: decode_certificate(
			"default certificate",
			request.default_certificate.as_deref(),
		)?,
		caption: request.caption,
		event_name: request.event_name,
		event_date: request.event_date,
		sender: request.sender,
		youtube_url: request.youtube_url.filter(|u| !u.is_empty()),
	})
}

/// POST /api/broadcast - run one broadcast and return per-recipient outcomes
#[axum::debug_handler]
pub async fn post_broadcast(
	State(app): State<App>,
	Auth(identity): Auth,
	Json(request): Json<BroadcastRequest>,
) -> ClResult<Json<BroadcastResponse>> {
	enforce(app.quota.as_ref(), &identity.operator, &BROADCAST_QUOTA)?;

	let input = into_input(&app, request).await?;
	let dispatcher = Dispatcher::for_app(&app);
	let report = dispatcher.dispatch(input, now()).await?;

	info!(
		broadcast_id = %report.broadcast_id,
		outcomes = report.outcomes.len(),
		"Broadcast dispatched"
	);

	Ok(Json(BroadcastResponse { broadcast_id: report.broadcast_id, results: report.outcomes }))
}

// Preview //
//*********//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
	pub recipient: PreviewRecipient,
	pub caption: String,
	pub event_name: String,
	pub event_date: String,
	pub sender: SenderIdentity,
	#[serde(default)]
	pub youtube_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRecipient {
	pub name: String,
	pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
	pub subject: String,
	pub html: String,
}

fn validate_preview(request: &PreviewRequest) -> ClResult<()> {
	validate::validate_recipient(&request.recipient.name, &request.recipient.email)?;
	validate::validate_sender(&request.sender)?;
	validate::validate_event_fields(&request.event_name, &request.event_date)?;
	validate::validate_caption(&request.caption)?;
	validate::validate_youtube_url(request.youtube_url.as_deref().filter(|u| !u.is_empty()))?;
	Ok(())
}

/// POST /api/broadcast/preview - render without sending
#[axum::debug_handler]
pub async fn post_preview(
	State(app): State<App>,
	Auth(_identity): Auth,
	Json(request): Json<PreviewRequest>,
) -> ClResult<Json<PreviewResponse>> {
	validate_preview(&request)?;

	let rendered = app.template_engine.render(&RenderInput {
		recipient_name: &request.recipient.name,
		caption: &request.caption,
		event_name: &request.event_name,
		event_date: &request.event_date,
		sender: &request.sender,
		youtube_url: request.youtube_url.as_deref().filter(|u| !u.is_empty()),
	})?;

	Ok(Json(PreviewResponse { subject: rendered.subject, html: rendered.html }))
}

// Test send //
//***********//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailRequest {
	pub recipient: PreviewRecipient,
	#[serde(default)]
	pub certificate: Option<String>,
	#[serde(default)]
	pub certificate_filename: Option<String>,
	pub caption: String,
	pub event_name: String,
	pub event_date: String,
	pub sender: SenderIdentity,
	#[serde(default)]
	pub youtube_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailResponse {
	pub sent_to: String,
}

/// POST /api/broadcast/test - send a single rendered email to the operator
#[axum::debug_handler]
pub async fn post_test_email(
	State(app): State<App>,
	Auth(identity): Auth,
	Json(request): Json<TestEmailRequest>,
) -> ClResult<Json<TestEmailResponse>> {
	enforce(app.quota.as_ref(), &identity.operator, &ANALYZE_QUOTA)?;

	let preview = PreviewRequest {
		recipient: PreviewRecipient {
			name: request.recipient.name.clone(),
			email: request.recipient.email.clone(),
		},
		caption: request.caption.clone(),
		event_name: request.event_name.clone(),
		event_date: request.event_date.clone(),
		sender: request.sender.clone(),
		youtube_url: request.youtube_url.clone(),
	};
	validate_preview(&preview)?;

	if !validate::is_valid_email(&identity.operator) {
		return Err(Error::ValidationError(
			"Operator identity is not a valid email address for a test send".into(),
		));
	}

	let rendered = app.template_engine.render(&RenderInput {
		recipient_name: &request.recipient.name,
		caption: &request.caption,
		event_name: &request.event_name,
		event_date: &request.event_date,
		sender: &request.sender,
		youtube_url: request.youtube_url.as_deref().filter(|u| !u.is_empty()),
	})?;

	let attachments = match decode_certificate("certificate", request.certificate.as_deref())? {
		Some(content) if !content.is_empty() => vec![Attachment {
			filename: request
				.certificate_filename
				.unwrap_or_else(|| attachment_filename(&request.recipient.name)),
			content,
		}],
		_ => Vec::new(),
	};

	app.transport
		.send(&OutgoingEmail {
			to: identity.operator.to_string(),
			subject: format!("[TEST] {}", rendered.subject),
			html: rendered.html,
			attachments,
		})
		.await?;

	Ok(Json(TestEmailResponse { sent_to: identity.operator.to_string() }))
}

// Report & cancel //
//*****************//

/// GET /api/broadcast/{id}/report - delivery ledger for one broadcast
#[axum::debug_handler]
pub async fn get_report(
	State(app): State<App>,
	Auth(_identity): Auth,
	Path(broadcast_id): Path<String>,
) -> ClResult<Json<ledger::DeliveryReport>> {
	Ok(Json(ledger::broadcast_report(&app.store, &broadcast_id).await?))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
	pub cancelled: bool,
}

/// POST /api/broadcast/{id}/cancel - advisory stop for an in-flight broadcast
#[axum::debug_handler]
pub async fn post_cancel(
	State(app): State<App>,
	Auth(_identity): Auth,
	Path(broadcast_id): Path<String>,
) -> ClResult<Json<CancelResponse>> {
	let cancelled = app.cancellations.cancel(&broadcast_id);
	if cancelled {
		info!(broadcast_id = %broadcast_id, "Cancellation requested");
	}
	Ok(Json(CancelResponse { cancelled }))
}

// vim: ts=4
