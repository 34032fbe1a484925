//! Delivery ledger read model.
//!
//! The recipient table is an append-only event log; the report derives the
//! current status per email as "latest row wins" and aggregates counts for
//! the UI. No business logic beyond aggregation lives here.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use sertimail_types::store_adapter::{RecipientRow, StoreAdapter};

use crate::prelude::*;

#[derive(Debug, Serialize)]
pub struct DeliveryReport {
	pub total: usize,
	pub success: usize,
	pub failed: usize,
	pub pending: usize,
	/// success/total, rounded to the nearest integer percent. 0 when empty.
	#[serde(rename = "successRate")]
	pub success_rate: u32,
	pub recipients: Vec<RecipientRow>,
}

/// Collapse the append-only rows (oldest first) to one row per email.
pub fn build_report(rows: Vec<RecipientRow>) -> DeliveryReport {
	let mut order: Vec<Box<str>> = Vec::new();
	let mut latest: HashMap<Box<str>, RecipientRow> = HashMap::new();

	for row in rows {
		if !latest.contains_key(&row.email) {
			order.push(row.email.clone());
		}
		latest.insert(row.email.clone(), row);
	}

	let recipients: Vec<RecipientRow> =
		order.iter().filter_map(|email| latest.remove(email)).collect();

	let total = recipients.len();
	let success = recipients.iter().filter(|r| r.status == DeliveryStatus::Success).count();
	let failed = recipients.iter().filter(|r| r.status == DeliveryStatus::Failed).count();
	let pending = recipients.iter().filter(|r| r.status == DeliveryStatus::Pending).count();
	let success_rate = if total == 0 {
		0
	} else {
		((success as f64) * 100.0 / (total as f64)).round() as u32
	};

	DeliveryReport { total, success, failed, pending, success_rate, recipients }
}

pub async fn broadcast_report(
	store: &Arc<dyn StoreAdapter>,
	broadcast_id: &str,
) -> ClResult<DeliveryReport> {
	// NotFound for unknown broadcasts rather than an empty report
	store.read_broadcast(broadcast_id).await?;
	let rows = store.list_recipients(broadcast_id).await?;
	Ok(build_report(rows))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(email: &str, status: DeliveryStatus, id: i64) -> RecipientRow {
		RecipientRow {
			recipient_id: id,
			broadcast_id: "b1".into(),
			name: "Ana".into(),
			email: email.into(),
			status,
			sent_at: None,
			created_at: Timestamp(id),
		}
	}

	#[test]
	fn test_empty_report() {
		let report = build_report(vec![]);
		assert_eq!(report.total, 0);
		assert_eq!(report.success_rate, 0);
	}

	#[test]
	fn test_latest_status_wins() {
		let report = build_report(vec![
			row("ana@x.com", DeliveryStatus::Pending, 1),
			row("budi@x.com", DeliveryStatus::Success, 2),
			row("ana@x.com", DeliveryStatus::Success, 3),
		]);
		assert_eq!(report.total, 2);
		assert_eq!(report.success, 2);
		assert_eq!(report.pending, 0);
		assert_eq!(report.success_rate, 100);
	}

	#[test]
	fn test_success_rate_rounding() {
		let report = build_report(vec![
			row("a@x.com", DeliveryStatus::Success, 1),
			row("b@x.com", DeliveryStatus::Failed, 2),
			row("c@x.com", DeliveryStatus::Failed, 3),
		]);
		// 1/3 rounds to 33
		assert_eq!(report.success_rate, 33);

		let report = build_report(vec![
			row("a@x.com", DeliveryStatus::Success, 1),
			row("b@x.com", DeliveryStatus::Success, 2),
			row("c@x.com", DeliveryStatus::Failed, 3),
		]);
		// 2/3 rounds to 67
		assert_eq!(report.success_rate, 67);
	}

	#[test]
	fn test_display_order_is_first_appearance() {
		let report = build_report(vec![
			row("a@x.com", DeliveryStatus::Pending, 1),
			row("b@x.com", DeliveryStatus::Pending, 2),
			row("a@x.com", DeliveryStatus::Failed, 3),
		]);
		assert_eq!(&*report.recipients[0].email, "a@x.com");
		assert_eq!(report.recipients[0].status, DeliveryStatus::Failed);
		assert_eq!(&*report.recipients[1].email, "b@x.com");
	}
}

// vim: ts=4
