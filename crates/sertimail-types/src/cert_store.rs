//! Certificate file store trait (local folder, remote drive, ...).

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ClResult;

/// One candidate certificate file.
#[derive(Clone, Debug)]
pub struct CertFile {
	/// Opaque id understood by `load` (a path for the fs store).
	pub file_id: Box<str>,
	pub name: Box<str>,
}

#[async_trait]
pub trait CertFileStore: Debug + Send + Sync {
	/// All candidate files. Pagination is the implementation's concern.
	async fn list_files(&self) -> ClResult<Vec<CertFile>>;

	/// `Ok(None)` signals "not retrievable", not an error; callers fall
	/// back to the default certificate or fail that recipient.
	async fn load(&self, file_id: &str) -> ClResult<Option<Vec<u8>>>;
}

// vim: ts=4
