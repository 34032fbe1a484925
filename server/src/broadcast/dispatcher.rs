//! Broadcast dispatcher.
//!
//! Owns the lifecycle of one broadcast invocation: validate the batch,
//! persist the Broadcast aggregate, enqueue the rate-limited tail as
//! pre-rendered pending rows, then work through the immediate head one send
//! at a time. A single recipient's transport failure is recorded and never
//! aborts the rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use sertimail_types::store_adapter::{CreateBroadcast, NewPendingEmail, StoreAdapter};
use sertimail_types::transport::{Attachment, EmailTransport, OutgoingEmail};

use crate::broadcast::validate;
use crate::certificate::attachment_filename;
use crate::config::{Config, EmailProvider};
use crate::core::app::CancelRegistry;
use crate::prelude::*;
use crate::template::{RenderInput, SenderIdentity, TemplateEngine, sanitize_html};

#[derive(Clone, Debug)]
pub struct RecipientInput {
	pub name: String,
	pub email: String,
	/// Per-recipient certificate, already resolved by the caller (remote
	/// storage or local folder match). Takes precedence over the default.
	pub certificate: Option<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct BroadcastInput {
	pub recipients: Vec<RecipientInput>,
	pub default_certificate: Option<Vec<u8>>,
	pub caption: String,
	pub event_name: String,
	pub event_date: String,
	pub sender: SenderIdentity,
	pub youtube_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SendOutcome {
	pub email: String,
	pub status: DeliveryStatus,
}

#[derive(Debug)]
pub struct DispatchReport {
	pub broadcast_id: String,
	pub outcomes: Vec<SendOutcome>,
}

#[derive(Clone, Debug)]
pub struct DispatchPolicy {
	pub provider: EmailProvider,
	pub daily_safe_limit: u32,
	pub immediate_batch_limit: u32,
	pub pending_delay_hours: i64,
	pub inter_send_delay_ms: u64,
}

impl DispatchPolicy {
	pub fn from_config(config: &Config) -> Self {
		Self {
			provider: config.provider,
			daily_safe_limit: config.daily_safe_limit,
			immediate_batch_limit: config.immediate_batch_limit,
			pending_delay_hours: config.pending_delay_hours,
			inter_send_delay_ms: config.inter_send_delay_ms,
		}
	}

	/// `min(N, min(daily_safe_limit, immediate_batch_limit))` under the
	/// rate-limited provider; the whole batch otherwise.
	pub fn immediate_count(&self, recipient_count: usize) -> usize {
		if self.provider.is_rate_limited() {
			recipient_count.min(self.daily_safe_limit.min(self.immediate_batch_limit) as usize)
		} else {
			recipient_count
		}
	}
}

pub struct Dispatcher {
	store: Arc<dyn StoreAdapter>,
	transport: Arc<dyn EmailTransport>,
	engine: Arc<TemplateEngine>,
	cancellations: Arc<CancelRegistry>,
	policy: DispatchPolicy,
}

impl Dispatcher {
	pub fn new(
		store: Arc<dyn StoreAdapter>,
		transport: Arc<dyn EmailTransport>,
		engine: Arc<TemplateEngine>,
		cancellations: Arc<CancelRegistry>,
		policy: DispatchPolicy,
	) -> Self {
		Self { store, transport, engine, cancellations, policy }
	}

	pub fn for_app(app: &App) -> Self {
		Self::new(
			app.store.clone(),
			app.transport.clone(),
			app.template_engine.clone(),
			app.cancellations.clone(),
			DispatchPolicy::from_config(&app.config),
		)
	}

	fn render(&self, input: &BroadcastInput, recipient: &RecipientInput) -> ClResult<crate::template::RenderedEmail> {
		self.engine.render(&RenderInput {
			recipient_name: &recipient.name,
			caption: &input.caption,
			event_name: &input.event_name,
			event_date: &input.event_date,
			sender: &input.sender,
			youtube_url: input.youtube_url.as_deref(),
		})
	}

	/// Run one broadcast. `now` anchors the pending schedule; pacing and
	/// transport calls still take real wall time.
	pub async fn dispatch(&self, input: BroadcastInput, now: Timestamp) -> ClResult<DispatchReport> {
		let input = normalize_input(input);
		validate::validate_broadcast_input(&input)?;

		// A batch with no resolvable certificate at all is rejected before
		// the Broadcast aggregate exists.
		let fallback_certificate = input
			.recipients
			.iter()
			.find_map(|r| r.certificate.as_ref().filter(|c| !c.is_empty()))
			.cloned()
			.or_else(|| input.default_certificate.clone())
			.filter(|c| !c.is_empty())
			.ok_or_else(|| {
				Error::ServiceUnavailable(
					"No certificate found. Upload a default certificate or make sure every recipient has one.".into(),
				)
			})?;

		let broadcast = self
			.store
			.create_broadcast(CreateBroadcast {
				event_name: sanitize_html(&input.event_name),
				event_date: sanitize_html(&input.event_date),
				caption: input.caption.clone(),
				certificate: fallback_certificate.clone(),
			})
			.await?;
		let broadcast_id = broadcast.broadcast_id.to_string();

		info!(
			broadcast_id = %broadcast_id,
			recipients = input.recipients.len(),
			"Broadcast created"
		);

		let cancel = self.cancellations.register(&broadcast_id);
		let outcomes =
			self.run_batch(&broadcast_id, &input, &fallback_certificate, now, &cancel).await;
		self.cancellations.remove(&broadcast_id);

		Ok(DispatchReport { broadcast_id, outcomes: outcomes? })
	}

	async fn run_batch(
		&self,
		broadcast_id: &str,
		input: &BroadcastInput,
		fallback_certificate: &[u8],
		now: Timestamp,
		cancel: &tokio_util::sync::CancellationToken,
	) -> ClResult<Vec<SendOutcome>> {
		let immediate_count = self.policy.immediate_count(input.recipients.len());
		let (immediate, pending) = input.recipients.split_at(immediate_count);
		let mut outcomes = Vec::with_capacity(input.recipients.len());

		// Pending tail: rendered once here, never re-personalized later.
		if !pending.is_empty() {
			let scheduled_for = now.plus_hours(self.policy.pending_delay_hours);
			let mut rows = Vec::with_capacity(pending.len());

			for recipient in pending {
				let rendered = self.render(input, recipient)?;
				rows.push(NewPendingEmail {
					name: recipient.name.clone(),
					email: recipient.email.clone(),
					subject: rendered.subject,
					html: rendered.html,
					certificate_filename: attachment_filename(&recipient.name),
					certificate: certificate_for(recipient, fallback_certificate),
					scheduled_for,
				});
			}
			self.store.create_pending_emails(broadcast_id, rows).await?;

			for recipient in pending {
				self.store
					.append_recipient(
						broadcast_id,
						&recipient.name,
						&recipient.email,
						DeliveryStatus::Pending,
						None,
					)
					.await?;
				outcomes.push(SendOutcome {
					email: recipient.email.clone(),
					status: DeliveryStatus::Pending,
				});
			}
			info!(
				broadcast_id = %broadcast_id,
				pending = pending.len(),
				scheduled_for = %scheduled_for,
				"Pending tail enqueued"
			);
		}

		// Immediate head: strictly sequential, paced between sends.
		for (index, recipient) in immediate.iter().enumerate() {
			if cancel.is_cancelled() {
				info!(broadcast_id = %broadcast_id, "Broadcast cancelled by operator");
				break;
			}

			let rendered = self.render(input, recipient)?;
			let email = OutgoingEmail {
				to: recipient.email.clone(),
				subject: rendered.subject,
				html: rendered.html,
				attachments: vec![Attachment {
					filename: attachment_filename(&recipient.name),
					content: certificate_for(recipient, fallback_certificate),
				}],
			};

			let status = match self.transport.send(&email).await {
				Ok(()) => DeliveryStatus::Success,
				Err(err) => {
					warn!("Failed to send to {}: {}", recipient.email, err);
					DeliveryStatus::Failed
				}
			};
			self.store
				.append_recipient(broadcast_id, &recipient.name, &recipient.email, status, None)
				.await?;
			outcomes.push(SendOutcome { email: recipient.email.clone(), status });

			if index < immediate.len() - 1 {
				tokio::time::sleep(Duration::from_millis(self.policy.inter_send_delay_ms)).await;
			}
		}

		Ok(outcomes)
	}
}

fn certificate_for(recipient: &RecipientInput, fallback: &[u8]) -> Vec<u8> {
	match recipient.certificate.as_ref().filter(|c| !c.is_empty()) {
		Some(cert) => cert.clone(),
		None => fallback.to_vec(),
	}
}

fn normalize_input(mut input: BroadcastInput) -> BroadcastInput {
	for recipient in &mut input.recipients {
		recipient.name = recipient.name.trim().to_string();
		recipient.email = recipient.email.trim().to_lowercase();
	}
	input.sender.name = input.sender.name.trim().to_string();
	input.sender.department = input.sender.department.trim().to_string();
	input.sender.contact = input.sender.contact.trim().to_string();
	input
}


// vim: ts=4
