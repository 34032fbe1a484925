//! Certificate resolution.
//!
//! Decides which attachment a recipient gets: an explicitly supplied
//! certificate wins, then a file-store match on the recipient's name, then
//! the broadcast's default. The file-store walk is bounded by a timeout and
//! fails closed; a recipient the store cannot serve falls back to the
//! default certificate rather than hanging the batch.

use async_trait::async_trait;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use sertimail_types::cert_store::{CertFile, CertFileStore};

use crate::core::extract::Auth;
use crate::core::rate_limit::{MATCH_CHECK_QUOTA, enforce};
use crate::prelude::*;

/// Attachment filename: whitespace runs become single underscores.
pub fn attachment_filename(recipient_name: &str) -> String {
	let mut out = String::from("Sertifikat_");
	let mut in_ws = false;
	for ch in recipient_name.chars() {
		if ch.is_whitespace() {
			if !in_ws {
				out.push('_');
				in_ws = true;
			}
		} else {
			out.push(ch);
			in_ws = false;
		}
	}
	out.push_str(".pdf");
	out
}

/// Lowercase, with every run of non-alphanumeric characters collapsed to a
/// single underscore. Applied to both recipient names and filenames so the
/// two become comparable.
pub fn normalize_name(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	let mut in_sep = false;
	for ch in value.to_lowercase().chars() {
		if ch.is_ascii_alphanumeric() {
			out.push(ch);
			in_sep = false;
		} else if !in_sep {
			out.push('_');
			in_sep = true;
		}
	}
	out
}

fn strip_extension(file_name: &str) -> &str {
	match file_name.rfind('.') {
		Some(idx) if idx > 0 => &file_name[..idx],
		_ => file_name,
	}
}

/// First candidate whose normalized name contains the normalized recipient
/// name, or vice versa. Ambiguous matches are a data-quality problem for
/// the operator, not something this resolver arbitrates.
pub fn find_match<'a>(recipient_name: &str, files: &'a [CertFile]) -> Option<&'a CertFile> {
	let normalized_recipient = normalize_name(recipient_name);
	if normalized_recipient.is_empty() {
		return None;
	}

	files.iter().find(|file| {
		let normalized_file = normalize_name(strip_extension(&file.name));
		normalized_file.contains(&normalized_recipient)
			|| normalized_recipient.contains(&normalized_file)
	})
}

/// Per-recipient match preview for the UI.
#[derive(Debug, Serialize)]
pub struct MatchPreview {
	pub name: String,
	pub email: String,
	pub matched: bool,
	#[serde(rename = "fileName")]
	pub file_name: Option<String>,
}

pub async fn check_matches(
	store: &dyn CertFileStore,
	recipients: &[(String, String)],
	timeout: Duration,
) -> ClResult<Vec<MatchPreview>> {
	let files = list_files_bounded(store, timeout).await;

	Ok(recipients
		.iter()
		.map(|(name, email)| {
			let matched = find_match(name, &files);
			MatchPreview {
				name: name.clone(),
				email: email.clone(),
				matched: matched.is_some(),
				file_name: matched.map(|f| f.name.to_string()),
			}
		})
		.collect())
}

/// Load the matching certificate for each recipient. Every failure mode
/// (timeout, unreadable file, no match) yields `None` for that recipient.
pub async fn resolve_for_recipients(
	store: &dyn CertFileStore,
	names: &[String],
	timeout: Duration,
) -> Vec<Option<Vec<u8>>> {
	let files = list_files_bounded(store, timeout).await;
	let mut resolved = Vec::with_capacity(names.len());

	for name in names {
		let bytes = match find_match(name, &files) {
			Some(file) => match tokio::time::timeout(timeout, store.load(&file.file_id)).await {
				Ok(Ok(bytes)) => bytes.filter(|b| !b.is_empty()),
				Ok(Err(err)) => {
					warn!("Certificate load failed for {}: {}", file.name, err);
					None
				}
				Err(_) => {
					warn!("Certificate load timed out for {}", file.name);
					None
				}
			},
			None => None,
		};
		resolved.push(bytes);
	}
	resolved
}

async fn list_files_bounded(store: &dyn CertFileStore, timeout: Duration) -> Vec<CertFile> {
	match tokio::time::timeout(timeout, store.list_files()).await {
		Ok(Ok(files)) => files,
		Ok(Err(err)) => {
			warn!("Certificate listing failed: {}", err);
			Vec::new()
		}
		Err(_) => {
			warn!("Certificate listing timed out");
			Vec::new()
		}
	}
}

/// Certificate store backed by a local folder of PDF files.
#[derive(Debug)]
pub struct LocalCertStore {
	dir: PathBuf,
}

impl LocalCertStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}
}

#[async_trait]
impl CertFileStore for LocalCertStore {
	async fn list_files(&self) -> ClResult<Vec<CertFile>> {
		let mut entries = tokio::fs::read_dir(&self.dir).await?;
		let mut files = Vec::new();

		while let Some(entry) = entries.next_entry().await? {
			if !entry.file_type().await?.is_file() {
				continue;
			}
			let name = entry.file_name().to_string_lossy().into_owned();
			if !name.to_lowercase().ends_with(".pdf") {
				continue;
			}
			files.push(CertFile {
				file_id: entry.path().to_string_lossy().into_owned().into(),
				name: name.into(),
			});
		}
		Ok(files)
	}

	async fn load(&self, file_id: &str) -> ClResult<Option<Vec<u8>>> {
		match tokio::fs::read(file_id).await {
			Ok(bytes) => Ok(Some(bytes)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}
}

// Handler //
//*********//

#[derive(Debug, Deserialize)]
pub struct CheckMatchesRequest {
	pub recipients: Vec<CheckMatchesRecipient>,
}

#[derive(Debug, Deserialize)]
pub struct CheckMatchesRecipient {
	pub name: String,
	pub email: String,
}

/// POST /api/certificates/check - preview per-recipient folder matches
#[axum::debug_handler]
pub async fn post_check_matches(
	State(app): State<App>,
	Auth(identity): Auth,
	Json(request): Json<CheckMatchesRequest>,
) -> ClResult<Json<Vec<MatchPreview>>> {
	enforce(app.quota.as_ref(), &identity.operator, &MATCH_CHECK_QUOTA)?;

	let Some(cert_store) = &app.cert_store else {
		return Err(Error::ServiceUnavailable("No certificate folder configured".into()));
	};

	let pairs: Vec<(String, String)> =
		request.recipients.into_iter().map(|r| (r.name, r.email)).collect();
	let timeout = Duration::from_millis(app.config.cert_lookup_timeout_ms);

	Ok(Json(check_matches(cert_store.as_ref(), &pairs, timeout).await?))
}


// vim: ts=4
