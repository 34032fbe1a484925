//! Vision analyzer trait.
//!
//! Extracts recipient/event metadata and a draft caption from an uploaded
//! certificate image. A failed call is user-visible and never retried
//! automatically; the operator re-uploads instead.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::error::ClResult;

#[derive(Clone, Debug, Serialize)]
pub struct CertificateAnalysis {
	#[serde(rename = "recipientName")]
	pub recipient_name: String,
	#[serde(rename = "eventName")]
	pub event_name: String,
	#[serde(rename = "eventDate")]
	pub event_date: String,
	pub caption: String,
}

#[async_trait]
pub trait VisionAnalyzer: Debug + Send + Sync {
	async fn analyze_certificate(&self, image: &[u8]) -> ClResult<CertificateAnalysis>;
}

// vim: ts=4
