//! App state type

use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

use sertimail_types::cert_store::CertFileStore;
use sertimail_types::store_adapter::StoreAdapter;
use sertimail_types::transport::EmailTransport;
use sertimail_types::vision::VisionAnalyzer;

use crate::config::Config;
use crate::core::rate_limit::{InMemoryQuota, QuotaChecker};
use crate::email::SmtpEmailSender;
use crate::prelude::*;
use crate::template::TemplateEngine;
use crate::{certificate, routes};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cooperative stop signals for in-flight broadcasts, keyed by broadcast id.
///
/// Cancellation only prevents starting further immediate sends; in-flight
/// transport calls finish and already-enqueued pending rows stay enqueued.
#[derive(Debug, Default)]
pub struct CancelRegistry {
	tokens: Mutex<HashMap<Box<str>, CancellationToken>>,
}

impl CancelRegistry {
	pub fn register(&self, broadcast_id: &str) -> CancellationToken {
		let token = CancellationToken::new();
		self.tokens.lock().insert(broadcast_id.into(), token.clone());
		token
	}

	pub fn cancel(&self, broadcast_id: &str) -> bool {
		match self.tokens.lock().get(broadcast_id) {
			Some(token) => {
				token.cancel();
				true
			}
			None => false,
		}
	}

	pub fn remove(&self, broadcast_id: &str) {
		self.tokens.lock().remove(broadcast_id);
	}

	/// Broadcast ids currently dispatching.
	pub fn active(&self) -> Vec<Box<str>> {
		self.tokens.lock().keys().cloned().collect()
	}
}

pub struct AppState {
	pub config: Config,
	pub store: Arc<dyn StoreAdapter>,
	pub transport: Arc<dyn EmailTransport>,
	pub cert_store: Option<Arc<dyn CertFileStore>>,
	pub vision: Option<Arc<dyn VisionAnalyzer>>,
	pub quota: Arc<dyn QuotaChecker>,
	pub template_engine: Arc<TemplateEngine>,
	pub cancellations: Arc<CancelRegistry>,
}

pub type App = Arc<AppState>;

pub struct AppBuilder {
	config: Option<Config>,
	store: Option<Arc<dyn StoreAdapter>>,
	transport: Option<Arc<dyn EmailTransport>>,
	cert_store: Option<Arc<dyn CertFileStore>>,
	vision: Option<Arc<dyn VisionAnalyzer>>,
	quota: Option<Arc<dyn QuotaChecker>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			config: None,
			store: None,
			transport: None,
			cert_store: None,
			vision: None,
			quota: None,
		}
	}

	pub fn config(mut self, config: Config) -> Self {
		self.config = Some(config);
		self
	}

	pub fn store(mut self, store: Arc<dyn StoreAdapter>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn transport(mut self, transport: Arc<dyn EmailTransport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn cert_store(mut self, cert_store: Arc<dyn CertFileStore>) -> Self {
		self.cert_store = Some(cert_store);
		self
	}

	pub fn vision(mut self, vision: Arc<dyn VisionAnalyzer>) -> Self {
		self.vision = Some(vision);
		self
	}

	pub fn quota(mut self, quota: Arc<dyn QuotaChecker>) -> Self {
		self.quota = Some(quota);
		self
	}

	pub fn build(self) -> ClResult<App> {
		let config = self.config.ok_or(Error::ConfigError("no config".into()))?;
		let store = self.store.ok_or(Error::ConfigError("no store adapter".into()))?;

		let transport: Arc<dyn EmailTransport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(SmtpEmailSender::new(config.smtp.clone())),
		};
		let cert_store: Option<Arc<dyn CertFileStore>> = match self.cert_store {
			Some(cert_store) => Some(cert_store),
			None => config
				.cert_dir
				.as_ref()
				.map(|dir| Arc::new(certificate::LocalCertStore::new(dir.clone())) as _),
		};
		let quota = self.quota.unwrap_or_else(|| Arc::new(InMemoryQuota::new()));

		Ok(Arc::new(AppState {
			config,
			store,
			transport,
			cert_store,
			vision: self.vision,
			quota,
			template_engine: Arc::new(TemplateEngine::new()?),
			cancellations: Arc::new(CancelRegistry::default()),
		}))
	}

	pub async fn run(self) -> ClResult<()> {
		tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.init();

		// A custom QuotaChecker manages its own state; the built-in
		// in-memory one needs a periodic sweep of expired windows.
		let builder = if self.quota.is_none() {
			let quota = Arc::new(InMemoryQuota::new());
			let sweeper = quota.clone();
			tokio::spawn(async move {
				let mut interval = tokio::time::interval(Duration::from_secs(60));
				loop {
					interval.tick().await;
					sweeper.sweep_expired(now());
				}
			});
			self.quota(quota)
		} else {
			self
		};

		let app = builder.build()?;
		info!("Sertimail v{}", VERSION);
		info!(
			"Provider: {:?} (rate limited: {})",
			app.config.provider,
			app.config.provider.is_rate_limited()
		);

		let router = routes::init(app.clone());
		let listener = tokio::net::TcpListener::bind(app.config.listen.as_str()).await?;
		info!("Listening on {}", app.config.listen);

		axum::serve(listener, router).await?;
		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
