//! Dispatcher integration tests: split logic, batch isolation, ordering,
//! pending pre-rendering, and cancellation.

mod common;

use std::sync::Arc;

use common::*;
use sertimail::broadcast::{DispatchPolicy, RecipientInput};
use sertimail::config::EmailProvider;
use sertimail::core::app::CancelRegistry;
use sertimail_types::error::Error;
use sertimail_types::types::{DeliveryStatus, PendingStatus, Timestamp};

fn setup(
	policy: DispatchPolicy,
) -> (Arc<MemoryStore>, Arc<MockTransport>, Arc<CancelRegistry>, sertimail::broadcast::Dispatcher)
{
	let store = MemoryStore::new();
	let transport = MockTransport::new();
	let cancellations = Arc::new(CancelRegistry::default());
	let dispatcher =
		build_dispatcher(store.clone(), transport.clone(), cancellations.clone(), policy);
	(store, transport, cancellations, dispatcher)
}

#[tokio::test]
async fn test_single_recipient_sends_immediately() {
	// Scenario A: one recipient, generous limits, transport succeeds
	let (store, transport, _, dispatcher) = setup(test_policy());

	let report = dispatcher
		.dispatch(test_input(vec![recipient("Ana", "ana@x.com")]), Timestamp(1000))
		.await
		.unwrap();

	assert_eq!(report.outcomes.len(), 1);
	assert_eq!(report.outcomes[0].email, "ana@x.com");
	assert_eq!(report.outcomes[0].status, DeliveryStatus::Success);

	let rows = store.recipient_rows();
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].status, DeliveryStatus::Success);

	assert!(store.pending_rows().is_empty());
	assert_eq!(transport.sent_to(), vec!["ana@x.com"]);
}

#[tokio::test]
async fn test_batch_splits_at_immediate_limit() {
	// Scenario B: 25 recipients, immediate_batch_limit 20
	let (store, transport, _, dispatcher) = setup(test_policy());
	let now = Timestamp(10_000);

	let report = dispatcher.dispatch(test_input(recipients(25)), now).await.unwrap();

	assert_eq!(report.outcomes.len(), 25);
	let pending_count =
		report.outcomes.iter().filter(|o| o.status == DeliveryStatus::Pending).count();
	let success_count =
		report.outcomes.iter().filter(|o| o.status == DeliveryStatus::Success).count();
	assert_eq!(pending_count, 5);
	assert_eq!(success_count, 20);

	let pending = store.pending_rows();
	assert_eq!(pending.len(), 5);
	for row in &pending {
		assert_eq!(row.status, PendingStatus::Pending);
		assert_eq!(row.scheduled_for, Timestamp(10_000 + 24 * 3600));
		assert_eq!(row.attempts, 0);
	}

	assert_eq!(transport.sent_to().len(), 20);
}

#[tokio::test]
async fn test_daily_safe_limit_caps_below_batch_limit() {
	let policy = DispatchPolicy { daily_safe_limit: 10, ..test_policy() };
	let (store, _, _, dispatcher) = setup(policy);

	let report = dispatcher.dispatch(test_input(recipients(25)), Timestamp(1000)).await.unwrap();

	let pending_count =
		report.outcomes.iter().filter(|o| o.status == DeliveryStatus::Pending).count();
	assert_eq!(pending_count, 15);
	assert_eq!(store.pending_rows().len(), 15);
}

#[tokio::test]
async fn test_non_rate_limited_provider_sends_whole_batch() {
	let policy = DispatchPolicy { provider: EmailProvider::Resend, ..test_policy() };
	let (store, transport, _, dispatcher) = setup(policy);

	let report = dispatcher.dispatch(test_input(recipients(25)), Timestamp(1000)).await.unwrap();

	assert!(report.outcomes.iter().all(|o| o.status == DeliveryStatus::Success));
	assert!(store.pending_rows().is_empty());
	assert_eq!(transport.sent_to().len(), 25);
}

#[tokio::test]
async fn test_single_failure_never_aborts_batch() {
	// P9: send #3 fails, the other four still go through
	let store = MemoryStore::new();
	let transport = MockTransport::failing_for(&["r3@x.com"]);
	let dispatcher = build_dispatcher(
		store.clone(),
		transport.clone(),
		Arc::new(CancelRegistry::default()),
		test_policy(),
	);

	let report = dispatcher.dispatch(test_input(recipients(5)), Timestamp(1000)).await.unwrap();

	assert_eq!(report.outcomes.len(), 5);
	let failed: Vec<&str> = report
		.outcomes
		.iter()
		.filter(|o| o.status == DeliveryStatus::Failed)
		.map(|o| o.email.as_str())
		.collect();
	assert_eq!(failed, vec!["r3@x.com"]);

	let rows = store.recipient_rows();
	assert_eq!(rows.iter().filter(|r| r.status == DeliveryStatus::Success).count(), 4);
	assert_eq!(rows.iter().filter(|r| r.status == DeliveryStatus::Failed).count(), 1);
}

#[tokio::test]
async fn test_outcomes_ordered_pending_first_then_send_order() {
	let (_, _, _, dispatcher) = setup(test_policy());

	let report = dispatcher.dispatch(test_input(recipients(25)), Timestamp(1000)).await.unwrap();

	// Pending tail (recipients 21..25) reported first, in original order
	for (i, outcome) in report.outcomes[..5].iter().enumerate() {
		assert_eq!(outcome.email, format!("r{}@x.com", 21 + i));
		assert_eq!(outcome.status, DeliveryStatus::Pending);
	}
	// Immediate head follows in send order
	for (i, outcome) in report.outcomes[5..].iter().enumerate() {
		assert_eq!(outcome.email, format!("r{}@x.com", 1 + i));
	}
}

#[tokio::test]
async fn test_pending_rows_are_pre_rendered() {
	let (store, _, _, dispatcher) = setup(test_policy());

	dispatcher.dispatch(test_input(recipients(25)), Timestamp(1000)).await.unwrap();

	for row in store.pending_rows() {
		// content frozen at enqueue time: personalized html and subject
		assert_eq!(&*row.subject, "E-Sertifikat: Webinar Nasional");
		assert!(row.html.contains(&*row.name));
		assert!(row.certificate_filename.starts_with("Sertifikat_Recipient_"));
		assert_eq!(row.certificate, vec![1, 2, 3]);
	}
}

#[tokio::test]
async fn test_per_recipient_certificate_takes_precedence() {
	let (store, transport, _, dispatcher) = setup(test_policy());

	let mut input = test_input(vec![
		recipient("Ana", "ana@x.com"),
		RecipientInput {
			name: "Budi".into(),
			email: "budi@x.com".into(),
			certificate: Some(vec![9, 9, 9]),
		},
	]);
	input.default_certificate = Some(vec![1, 2, 3]);

	dispatcher.dispatch(input, Timestamp(1000)).await.unwrap();

	let sent = transport.sent.lock().clone();
	// Budi's own certificate wins for Budi, and as the first available
	// certificate it also becomes the session fallback stored on the
	// Broadcast, which Ana falls back to.
	assert_eq!(sent[1].attachments[0].content, vec![9, 9, 9]);
	assert_eq!(sent[1].attachments[0].filename, "Sertifikat_Budi.pdf");
	assert_eq!(sent[0].attachments[0].content, vec![9, 9, 9]);
	assert_eq!(store.broadcasts()[0].certificate, vec![9, 9, 9]);
}

#[tokio::test]
async fn test_default_certificate_used_when_no_recipient_has_one() {
	let (store, transport, _, dispatcher) = setup(test_policy());

	let mut input = test_input(vec![recipient("Ana", "ana@x.com")]);
	input.default_certificate = Some(vec![1, 2, 3]);

	dispatcher.dispatch(input, Timestamp(1000)).await.unwrap();

	let sent = transport.sent.lock().clone();
	assert_eq!(sent[0].attachments[0].content, vec![1, 2, 3]);
	assert_eq!(store.broadcasts()[0].certificate, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_empty_batch_rejected_without_persisting() {
	let (store, transport, _, dispatcher) = setup(test_policy());

	let result = dispatcher.dispatch(test_input(vec![]), Timestamp(1000)).await;
	assert!(matches!(result, Err(Error::ValidationError(_))));
	assert!(store.broadcasts().is_empty());
	assert!(transport.sent_to().is_empty());
}

#[tokio::test]
async fn test_no_certificate_anywhere_rejected_before_creation() {
	let (store, _, _, dispatcher) = setup(test_policy());

	let mut input = test_input(recipients(2));
	input.default_certificate = None;

	let result = dispatcher.dispatch(input, Timestamp(1000)).await;
	assert!(matches!(result, Err(Error::ServiceUnavailable(_))));
	assert!(store.broadcasts().is_empty());
}

#[tokio::test]
async fn test_first_recipient_certificate_becomes_fallback() {
	let (store, _, _, dispatcher) = setup(test_policy());

	let mut input = test_input(vec![
		RecipientInput {
			name: "Ana".into(),
			email: "ana@x.com".into(),
			certificate: Some(vec![5, 5]),
		},
		recipient("Budi", "budi@x.com"),
	]);
	input.default_certificate = None;

	dispatcher.dispatch(input, Timestamp(1000)).await.unwrap();

	assert_eq!(store.broadcasts()[0].certificate, vec![5, 5]);
}

#[tokio::test]
async fn test_cancellation_stops_between_sends() {
	let (store, _, cancellations, _) = setup(test_policy());
	let transport = MockTransport::new();
	let dispatcher = build_dispatcher(
		store.clone(),
		transport.clone(),
		cancellations.clone(),
		test_policy(),
	);

	// Cancel every active broadcast as soon as the first send starts; the
	// check runs between sends, so exactly one outcome is recorded.
	{
		let cancellations = cancellations.clone();
		transport.set_on_send(Box::new(move |_| {
			for id in cancellations.active() {
				cancellations.cancel(&id);
			}
		}));
	}

	let report = dispatcher.dispatch(test_input(recipients(5)), Timestamp(1000)).await.unwrap();

	assert_eq!(report.outcomes.len(), 1);
	assert_eq!(store.recipient_rows().len(), 1);
	assert_eq!(transport.sent_to().len(), 1);
}

#[tokio::test]
async fn test_pending_ledger_rows_written_for_tail() {
	let (store, _, _, dispatcher) = setup(test_policy());

	dispatcher.dispatch(test_input(recipients(25)), Timestamp(1000)).await.unwrap();

	let rows = store.recipient_rows();
	assert_eq!(rows.iter().filter(|r| r.status == DeliveryStatus::Pending).count(), 5);
	assert_eq!(rows.iter().filter(|r| r.status == DeliveryStatus::Success).count(), 20);
}

// vim: ts=4
