//! Batch-level input validation.
//!
//! Everything here rejects the whole batch before anything is persisted or
//! sent. Per-recipient transport failures are not validation concerns.

use crate::broadcast::dispatcher::BroadcastInput;
use crate::prelude::*;
use crate::template::{SenderIdentity, is_valid_youtube_url};

pub const MAX_RECIPIENTS: usize = 5000;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_CAPTION_LEN: usize = 10_000;
pub const MAX_EVENT_NAME_LEN: usize = 200;
pub const MAX_EVENT_DATE_LEN: usize = 100;
pub const MAX_SENDER_FIELD_LEN: usize = 100;

pub fn is_valid_email(email: &str) -> bool {
	!email.is_empty() && email.len() <= MAX_EMAIL_LEN && email.parse::<lettre::Address>().is_ok()
}

pub fn validate_recipient(name: &str, email: &str) -> ClResult<()> {
	if name.trim().is_empty() {
		return Err(Error::ValidationError("Recipient name is required".into()));
	}
	if name.len() > MAX_NAME_LEN {
		return Err(Error::ValidationError(format!("Recipient name too long: {}", name)));
	}
	if !is_valid_email(email) {
		return Err(Error::ValidationError(format!("Invalid email address: {}", email)));
	}
	Ok(())
}

pub fn validate_sender(sender: &SenderIdentity) -> ClResult<()> {
	if sender.name.trim().is_empty() {
		return Err(Error::ValidationError("Sender name is required".into()));
	}
	if sender.department.trim().is_empty() {
		return Err(Error::ValidationError("Sender department is required".into()));
	}
	if sender.name.len() > MAX_SENDER_FIELD_LEN
		|| sender.department.len() > MAX_SENDER_FIELD_LEN
		|| sender.contact.len() > MAX_SENDER_FIELD_LEN
	{
		return Err(Error::ValidationError("Sender field too long".into()));
	}
	Ok(())
}

pub fn validate_event_fields(event_name: &str, event_date: &str) -> ClResult<()> {
	if event_name.trim().is_empty() {
		return Err(Error::ValidationError("Event name is required".into()));
	}
	if event_name.len() > MAX_EVENT_NAME_LEN {
		return Err(Error::ValidationError("Event name too long".into()));
	}
	if event_date.trim().is_empty() {
		return Err(Error::ValidationError("Event date is required".into()));
	}
	if event_date.len() > MAX_EVENT_DATE_LEN {
		return Err(Error::ValidationError("Event date too long".into()));
	}
	Ok(())
}

pub fn validate_caption(caption: &str) -> ClResult<()> {
	if caption.len() > MAX_CAPTION_LEN {
		return Err(Error::ValidationError("Caption too long".into()));
	}
	Ok(())
}

pub fn validate_youtube_url(youtube_url: Option<&str>) -> ClResult<()> {
	if let Some(url) = youtube_url {
		if !is_valid_youtube_url(url) {
			return Err(Error::ValidationError(
				"Invalid YouTube URL. Only youtube.com and youtu.be URLs are allowed.".into(),
			));
		}
	}
	Ok(())
}

/// Whole-batch validation, run before anything is persisted.
pub fn validate_broadcast_input(input: &BroadcastInput) -> ClResult<()> {
	if input.recipients.is_empty() {
		return Err(Error::ValidationError("At least one recipient is required".into()));
	}
	if input.recipients.len() > MAX_RECIPIENTS {
		return Err(Error::ValidationError(format!(
			"At most {} recipients per broadcast",
			MAX_RECIPIENTS
		)));
	}
	for recipient in &input.recipients {
		validate_recipient(&recipient.name, &recipient.email)?;
	}
	validate_sender(&input.sender)?;
	validate_event_fields(&input.event_name, &input.event_date)?;
	validate_caption(&input.caption)?;
	validate_youtube_url(input.youtube_url.as_deref())?;
	Ok(())
}


// vim: ts=4
