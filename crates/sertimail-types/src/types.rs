//! Common types used throughout Sertimail.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

// Timestamp //
//***********//
/// Unix epoch seconds. Stored as-is in the database.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn plus_hours(self, hours: i64) -> Timestamp {
		Timestamp(self.0 + hours * 3600)
	}

	pub fn plus_minutes(self, minutes: i64) -> Timestamp {
		Timestamp(self.0 + minutes * 60)
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

pub fn now() -> Timestamp {
	let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
	Timestamp(res.as_secs() as i64)
}

// Delivery status //
//*****************//
/// Ledger status of one recipient row. The ledger is append-only; the
/// latest row per (broadcast_id, email) wins for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
	Pending,
	Success,
	Failed,
}

impl DeliveryStatus {
	pub fn as_code(self) -> char {
		match self {
			DeliveryStatus::Pending => 'P',
			DeliveryStatus::Success => 'S',
			DeliveryStatus::Failed => 'F',
		}
	}

	pub fn from_code(code: char) -> Option<DeliveryStatus> {
		match code {
			'P' => Some(DeliveryStatus::Pending),
			'S' => Some(DeliveryStatus::Success),
			'F' => Some(DeliveryStatus::Failed),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			DeliveryStatus::Pending => "pending",
			DeliveryStatus::Success => "success",
			DeliveryStatus::Failed => "failed",
		}
	}
}

impl Serialize for DeliveryStatus {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

// Pending queue status //
//**********************//
/// Status of one durable pending row.
///
/// `Pending --send ok--> Sent` (terminal)
/// `Pending --send fails, attempts <  max_retry--> Pending` (rescheduled)
/// `Pending --send fails, attempts >= max_retry--> Failed` (terminal)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingStatus {
	Pending,
	Sent,
	Failed,
}

impl PendingStatus {
	pub fn as_code(self) -> char {
		match self {
			PendingStatus::Pending => 'P',
			PendingStatus::Sent => 'S',
			PendingStatus::Failed => 'F',
		}
	}

	pub fn from_code(code: char) -> Option<PendingStatus> {
		match code {
			'P' => Some(PendingStatus::Pending),
			'S' => Some(PendingStatus::Sent),
			'F' => Some(PendingStatus::Failed),
			_ => None,
		}
	}
}

// vim: ts=4
