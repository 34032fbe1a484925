//! Per-operator action quotas.
//!
//! Process-local, fixed-window, best-effort throttling. This is not the
//! sending safety mechanism (that is the daily-limit/immediate-batch split);
//! it only stops one operator from hammering the expensive actions. The
//! `QuotaChecker` seam lets a deployment back it with a shared store
//! without touching call sites.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

#[derive(Clone, Copy, Debug)]
pub struct QuotaConfig {
	pub max_requests: u32,
	pub window_secs: i64,
}

/// 5 broadcasts per hour
pub const BROADCAST_QUOTA: QuotaConfig = QuotaConfig { max_requests: 5, window_secs: 3600 };
/// 20 analyses per minute
pub const ANALYZE_QUOTA: QuotaConfig = QuotaConfig { max_requests: 20, window_secs: 60 };
/// 10 certificate match checks per minute
pub const MATCH_CHECK_QUOTA: QuotaConfig = QuotaConfig { max_requests: 10, window_secs: 60 };

#[derive(Clone, Copy, Debug)]
pub struct QuotaDecision {
	pub allowed: bool,
	pub remaining: u32,
	pub reset_at: Timestamp,
}

pub trait QuotaChecker: Debug + Send + Sync {
	fn check(&self, identifier: &str, config: &QuotaConfig, now: Timestamp) -> QuotaDecision;
}

/// Reject with a retry-after hint when the quota is exhausted.
pub fn enforce(
	checker: &dyn QuotaChecker,
	identifier: &str,
	config: &QuotaConfig,
) -> ClResult<()> {
	let decision = checker.check(identifier, config, now());
	if decision.allowed {
		return Ok(());
	}
	let wait = (decision.reset_at.0 - now().0).max(0);
	Err(Error::RateLimited(format!("Rate limit exceeded. Please wait {} seconds.", wait)))
}

#[derive(Debug)]
struct QuotaEntry {
	count: u32,
	reset_at: Timestamp,
}

#[derive(Debug, Default)]
pub struct InMemoryQuota {
	store: RwLock<HashMap<String, QuotaEntry>>,
}

impl InMemoryQuota {
	pub fn new() -> Self {
		Self::default()
	}

	/// Drop expired windows. Called periodically from the app.
	pub fn sweep_expired(&self, now: Timestamp) {
		self.store.write().retain(|_, entry| entry.reset_at > now);
	}
}

impl QuotaChecker for InMemoryQuota {
	fn check(&self, identifier: &str, config: &QuotaConfig, now: Timestamp) -> QuotaDecision {
		let mut store = self.store.write();

		match store.get_mut(identifier) {
			Some(entry) if now <= entry.reset_at => {
				if entry.count >= config.max_requests {
					return QuotaDecision { allowed: false, remaining: 0, reset_at: entry.reset_at };
				}
				entry.count += 1;
				QuotaDecision {
					allowed: true,
					remaining: config.max_requests - entry.count,
					reset_at: entry.reset_at,
				}
			}
			_ => {
				let reset_at = Timestamp(now.0 + config.window_secs);
				store.insert(identifier.to_string(), QuotaEntry { count: 1, reset_at });
				QuotaDecision { allowed: true, remaining: config.max_requests - 1, reset_at }
			}
		}
	}
}


// vim: ts=4
