//! Environment-derived configuration.
//!
//! Numeric settings fall back to their defaults when unset, unparsable, or
//! below 1, so a broken deployment never disables the provider safety
//! limits by accident.

use std::env;
use std::path::PathBuf;

use crate::prelude::*;

pub const DAILY_SAFE_LIMIT_DEFAULT: u32 = 450;
pub const PENDING_DELAY_HOURS_DEFAULT: i64 = 24;
pub const IMMEDIATE_BATCH_LIMIT_DEFAULT: u32 = 20;
pub const PENDING_RETRY_DELAY_MINUTES_DEFAULT: i64 = 30;
pub const PENDING_MAX_RETRY_DEFAULT: i64 = 3;
pub const EMAIL_DELAY_MS_DEFAULT: u64 = 1000;
pub const CERT_LOOKUP_TIMEOUT_MS_DEFAULT: u64 = 45_000;

/// Active outgoing mail provider.
///
/// The immediate/pending split and the recovery cron only apply to the
/// rate-limited provider; everything else sends the whole batch inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailProvider {
	Gmail,
	Resend,
}

impl EmailProvider {
	pub fn is_rate_limited(self) -> bool {
		matches!(self, EmailProvider::Gmail)
	}

	fn parse(value: &str) -> EmailProvider {
		match value.to_lowercase().as_str() {
			"resend" => EmailProvider::Resend,
			_ => EmailProvider::Gmail,
		}
	}
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	pub from_address: String,
	pub from_name: String,
	/// "none", "starttls", or "tls"
	pub tls_mode: String,
	pub timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
	pub listen: String,
	pub db_dir: PathBuf,
	pub auth_secret: String,
	/// Shared secret for the recovery cron endpoint. The endpoint rejects
	/// every call when unset.
	pub cron_secret: Option<String>,
	pub provider: EmailProvider,
	pub daily_safe_limit: u32,
	pub immediate_batch_limit: u32,
	pub pending_delay_hours: i64,
	pub retry_delay_minutes: i64,
	pub max_retry: i64,
	pub inter_send_delay_ms: u64,
	/// Local folder scanned for per-recipient certificate matches.
	pub cert_dir: Option<PathBuf>,
	pub cert_lookup_timeout_ms: u64,
	pub smtp: SmtpConfig,
}

/// Parse a positive number, falling back to the default on anything else.
fn parse_bounded<T: std::str::FromStr + PartialOrd + From<u8>>(
	value: Option<String>,
	default: T,
) -> T {
	match value.and_then(|v| v.parse::<T>().ok()) {
		Some(n) if n >= T::from(1) => n,
		_ => default,
	}
}

fn env_u32(name: &str, default: u32) -> u32 {
	parse_bounded(env::var(name).ok(), default)
}

fn env_i64(name: &str, default: i64) -> i64 {
	parse_bounded(env::var(name).ok(), default)
}

fn env_u64(name: &str, default: u64) -> u64 {
	parse_bounded(env::var(name).ok(), default)
}

impl Config {
	pub fn from_env() -> ClResult<Config> {
		let auth_secret = env::var("AUTH_SECRET")
			.map_err(|_| Error::ConfigError("AUTH_SECRET is not set".into()))?;

		let smtp = SmtpConfig {
			host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
			port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(587),
			username: env::var("SMTP_USERNAME").unwrap_or_default(),
			password: env::var("SMTP_PASSWORD").unwrap_or_default(),
			from_address: env::var("SMTP_FROM_ADDRESS").unwrap_or_default(),
			from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Panitia Webinar".into()),
			tls_mode: env::var("SMTP_TLS_MODE").unwrap_or_else(|_| "starttls".into()),
			timeout_seconds: env_u64("SMTP_TIMEOUT_SECONDS", 30),
		};

		Ok(Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".into()),
			db_dir: PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".into())),
			auth_secret,
			cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
			provider: EmailProvider::parse(&env::var("EMAIL_PROVIDER").unwrap_or_default()),
			daily_safe_limit: env_u32("DAILY_SAFE_LIMIT", DAILY_SAFE_LIMIT_DEFAULT),
			immediate_batch_limit: env_u32("IMMEDIATE_BATCH_LIMIT", IMMEDIATE_BATCH_LIMIT_DEFAULT),
			pending_delay_hours: env_i64("PENDING_DELAY_HOURS", PENDING_DELAY_HOURS_DEFAULT),
			retry_delay_minutes: env_i64(
				"PENDING_RETRY_DELAY_MINUTES",
				PENDING_RETRY_DELAY_MINUTES_DEFAULT,
			),
			max_retry: env_i64("PENDING_MAX_RETRY", PENDING_MAX_RETRY_DEFAULT),
			inter_send_delay_ms: env_u64("EMAIL_DELAY_MS", EMAIL_DELAY_MS_DEFAULT),
			cert_dir: env::var("CERT_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from),
			cert_lookup_timeout_ms: env_u64(
				"CERT_LOOKUP_TIMEOUT_MS",
				CERT_LOOKUP_TIMEOUT_MS_DEFAULT,
			),
			smtp,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_provider_parse() {
		assert_eq!(EmailProvider::parse("gmail"), EmailProvider::Gmail);
		assert_eq!(EmailProvider::parse("GMAIL"), EmailProvider::Gmail);
		assert_eq!(EmailProvider::parse("resend"), EmailProvider::Resend);
		// unknown values fall back to the rate-limited provider
		assert_eq!(EmailProvider::parse("sendgrid"), EmailProvider::Gmail);
		assert_eq!(EmailProvider::parse(""), EmailProvider::Gmail);
	}

	#[test]
	fn test_rate_limited_provider() {
		assert!(EmailProvider::Gmail.is_rate_limited());
		assert!(!EmailProvider::Resend.is_rate_limited());
	}

	#[test]
	fn test_parse_bounded_rejects_garbage() {
		assert_eq!(parse_bounded::<u32>(None, 450), 450);
		assert_eq!(parse_bounded::<u32>(Some("0".into()), 450), 450);
		assert_eq!(parse_bounded::<u32>(Some("-3".into()), 450), 450);
		assert_eq!(parse_bounded::<u32>(Some("abc".into()), 450), 450);
		assert_eq!(parse_bounded::<u32>(Some("20".into()), 450), 20);
		assert_eq!(parse_bounded::<i64>(Some("24".into()), 1), 24);
	}
}

// vim: ts=4
