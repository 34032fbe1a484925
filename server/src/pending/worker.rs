//! Pending recovery worker.
//!
//! Stateless, idempotent-per-invocation pass over the due pending rows.
//! Content was frozen at enqueue time; this only transports bytes and
//! advances each row's own state machine:
//!
//! `pending --send ok--> sent`, `pending --fail, attempts < max--> pending`
//! (rescheduled), `pending --fail, attempts >= max--> failed` (frozen).
//!
//! Overlapping invocations are safe in the at-least-once sense: every
//! mutation is guarded by the row's own status, so a row finished by a
//! concurrent pass simply stops matching. Duplicate sends are bounded by
//! rows fetched in the same race window; exactly-once is explicitly not
//! guaranteed.

use serde::Serialize;
use serde_with::skip_serializing_none;
use std::sync::Arc;

use sertimail_types::store_adapter::StoreAdapter;
use sertimail_types::transport::{Attachment, EmailTransport, OutgoingEmail};

use crate::config::{Config, EmailProvider};
use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct RecoveryPolicy {
	pub provider: EmailProvider,
	pub daily_safe_limit: u32,
	pub retry_delay_minutes: i64,
	pub max_retry: i64,
}

impl RecoveryPolicy {
	pub fn from_config(config: &Config) -> Self {
		Self {
			provider: config.provider,
			daily_safe_limit: config.daily_safe_limit,
			retry_delay_minutes: config.retry_delay_minutes,
			max_retry: config.max_retry,
		}
	}
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct RecoverySummary {
	pub processed: usize,
	pub sent: usize,
	pub failed: usize,
	pub message: Option<String>,
}

/// One recovery pass: select due rows (oldest first, capped at the daily
/// safety ceiling) and attempt each. One row's failure never stops the
/// rest of the pass.
pub async fn process_due_pending(
	store: &Arc<dyn StoreAdapter>,
	transport: &Arc<dyn EmailTransport>,
	policy: &RecoveryPolicy,
	now: Timestamp,
) -> ClResult<RecoverySummary> {
	if !policy.provider.is_rate_limited() {
		return Ok(RecoverySummary {
			processed: 0,
			sent: 0,
			failed: 0,
			message: Some("Skipped: email provider is not rate limited".into()),
		});
	}

	let due = store.list_due_pending(now, policy.daily_safe_limit).await?;
	let processed = due.len();
	let mut sent = 0usize;
	let mut failed = 0usize;

	for row in due {
		let email = OutgoingEmail {
			to: row.email.to_string(),
			subject: row.subject.to_string(),
			html: row.html.to_string(),
			attachments: vec![Attachment {
				filename: row.certificate_filename.to_string(),
				content: row.certificate.clone(),
			}],
		};

		match transport.send(&email).await {
			Ok(()) => {
				store.mark_pending_sent(row.pending_id, now).await?;
				store
					.resolve_pending_recipient(
						&row.broadcast_id,
						&row.email,
						DeliveryStatus::Success,
						Some(now),
					)
					.await?;
				sent += 1;
			}
			Err(err) => {
				failed += 1;
				let next_attempt = row.attempts + 1;
				let message = err.to_string();

				if next_attempt >= policy.max_retry {
					store.mark_pending_failed(row.pending_id, next_attempt, &message).await?;
					store
						.resolve_pending_recipient(
							&row.broadcast_id,
							&row.email,
							DeliveryStatus::Failed,
							None,
						)
						.await?;
					warn!(
						pending_id = row.pending_id,
						email = %row.email,
						attempts = next_attempt,
						"Pending email permanently failed"
					);
				} else {
					store
						.mark_pending_retry(
							row.pending_id,
							next_attempt,
							&message,
							now.plus_minutes(policy.retry_delay_minutes),
						)
						.await?;
					debug!(
						pending_id = row.pending_id,
						email = %row.email,
						attempts = next_attempt,
						"Pending email rescheduled"
					);
				}
			}
		}
	}

	info!(processed, sent, failed, "Pending recovery pass finished");
	Ok(RecoverySummary { processed, sent, failed, message: None })
}

// vim: ts=4
