//! SMTP email sender using lettre
//!
//! Builds a multipart message (HTML body + PDF attachments) and delivers it
//! over the configured SMTP relay.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as LettreAttachment, MultiPart, SinglePart};
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use sertimail_types::transport::{EmailTransport, OutgoingEmail};

use crate::config::SmtpConfig;
use crate::prelude::*;

#[derive(Debug)]
pub struct SmtpEmailSender {
	config: SmtpConfig,
}

impl SmtpEmailSender {
	pub fn new(config: SmtpConfig) -> Self {
		Self { config }
	}

	fn build_tls(&self) -> ClResult<lettre::transport::smtp::client::Tls> {
		use lettre::transport::smtp::client::{Tls, TlsParameters};

		match self.config.tls_mode.as_str() {
			"tls" => Ok(Tls::Wrapper(
				TlsParameters::builder(self.config.host.clone())
					.build()
					.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
			)),
			"starttls" => Ok(Tls::Opportunistic(
				TlsParameters::builder(self.config.host.clone())
					.build()
					.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
			)),
			"none" => Ok(Tls::None),
			mode => Err(Error::ConfigError(format!(
				"Invalid TLS mode: {}. Must be 'none', 'starttls', or 'tls'",
				mode
			))),
		}
	}
}

#[async_trait]
impl EmailTransport for SmtpEmailSender {
	async fn send(&self, email: &OutgoingEmail) -> ClResult<()> {
		let config = &self.config;

		if config.host.is_empty() || config.from_address.is_empty() {
			return Err(Error::ConfigError("SMTP host or from address not configured".into()));
		}
		if !email.to.contains('@') {
			return Err(Error::ValidationError("Invalid recipient email address".into()));
		}

		debug!("Sending email to {} via {}:{}", email.to, config.host, config.port);

		let builder = Message::builder()
			.from(
				format!("{} <{}>", config.from_name, config.from_address)
					.parse()
					.map_err(|_| Error::ValidationError("Invalid from email format".into()))?,
			)
			.to(email
				.to
				.parse()
				.map_err(|_| Error::ValidationError("Invalid recipient email format".into()))?)
			.subject(&email.subject);

		let mut multipart = MultiPart::mixed().singlepart(SinglePart::html(email.html.clone()));
		for attachment in &email.attachments {
			multipart = multipart.singlepart(
				LettreAttachment::new(attachment.filename.clone())
					.body(attachment.content.clone(), ContentType::parse("application/pdf")
						.map_err(|e| Error::Internal(format!("content type: {}", e)))?),
			);
		}

		let message = builder
			.multipart(multipart)
			.map_err(|e| Error::ValidationError(format!("Failed to build email: {}", e)))?;

		let credentials = Credentials::new(config.username.clone(), config.password.clone());
		let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
			.port(config.port)
			.timeout(Some(Duration::from_secs(config.timeout_seconds)))
			.tls(self.build_tls()?)
			.credentials(credentials)
			.build();

		match mailer.send(message).await {
			Ok(response) => {
				info!("Email sent successfully to {} (response: {:?})", email.to, response);
				Ok(())
			}
			Err(e) => {
				warn!("Failed to send email to {}: {}", email.to, e);
				Err(Error::ServiceUnavailable(format!("SMTP send failed: {}", e)))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sertimail_types::transport::Attachment;

	fn test_config() -> SmtpConfig {
		SmtpConfig {
			host: "smtp.example.com".into(),
			port: 587,
			username: "user".into(),
			password: "pass".into(),
			from_address: "noreply@example.com".into(),
			from_name: "Panitia Webinar".into(),
			tls_mode: "starttls".into(),
			timeout_seconds: 30,
		}
	}

	#[test]
	fn test_tls_mode_selection() {
		let mut config = test_config();
		assert!(SmtpEmailSender::new(config.clone()).build_tls().is_ok());

		config.tls_mode = "tls".into();
		assert!(SmtpEmailSender::new(config.clone()).build_tls().is_ok());

		config.tls_mode = "none".into();
		assert!(SmtpEmailSender::new(config.clone()).build_tls().is_ok());

		config.tls_mode = "ssl".into();
		assert!(SmtpEmailSender::new(config).build_tls().is_err());
	}

	#[tokio::test]
	async fn test_invalid_recipient_rejected_before_connect() {
		let sender = SmtpEmailSender::new(test_config());
		let email = OutgoingEmail {
			to: "not-an-address".into(),
			subject: "Test".into(),
			html: "<p>Test</p>".into(),
			attachments: vec![Attachment { filename: "a.pdf".into(), content: vec![1, 2, 3] }],
		};
		assert!(matches!(sender.send(&email).await, Err(Error::ValidationError(_))));
	}
}

// vim: ts=4
