//! In-memory test adapters and fixture builders.
//!
//! `MemoryStore` mirrors the SQLite adapter's semantics (status-guarded
//! updates, oldest-first due selection) without touching disk, so the
//! dispatcher and worker tests stay fast and deterministic.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use sertimail::broadcast::{BroadcastInput, DispatchPolicy, Dispatcher, RecipientInput};
use sertimail::config::EmailProvider;
use sertimail::core::app::CancelRegistry;
use sertimail::template::{SenderIdentity, TemplateEngine};
use sertimail_types::error::{ClResult, Error};
use sertimail_types::store_adapter::{
	Broadcast, CreateBroadcast, NewPendingEmail, PendingEmail, RecipientRow, SenderProfile,
	SenderProfileData, StoreAdapter,
};
use sertimail_types::transport::{EmailTransport, OutgoingEmail};
use sertimail_types::types::{DeliveryStatus, PendingStatus, Timestamp, now};
use sertimail_types::utils::random_id;

// MemoryStore //
//*************//

#[derive(Debug, Default)]
struct MemoryState {
	broadcasts: Vec<Broadcast>,
	recipients: Vec<RecipientRow>,
	pending: Vec<PendingEmail>,
	profiles: Vec<SenderProfile>,
	next_recipient_id: i64,
	next_pending_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
	state: Mutex<MemoryState>,
}

impl MemoryStore {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn broadcasts(&self) -> Vec<Broadcast> {
		self.state.lock().broadcasts.clone()
	}

	pub fn recipient_rows(&self) -> Vec<RecipientRow> {
		self.state.lock().recipients.clone()
	}

	pub fn pending_rows(&self) -> Vec<PendingEmail> {
		self.state.lock().pending.clone()
	}

	/// Seed one pending row directly, bypassing the dispatcher.
	pub fn seed_pending(&self, row: PendingEmail) {
		self.state.lock().pending.push(row);
	}
}

#[async_trait]
impl StoreAdapter for MemoryStore {
	async fn create_broadcast(&self, data: CreateBroadcast) -> ClResult<Broadcast> {
		let broadcast = Broadcast {
			broadcast_id: random_id().into(),
			event_name: data.event_name.into(),
			event_date: data.event_date.into(),
			caption: data.caption.into(),
			certificate: data.certificate,
			created_at: now(),
		};
		self.state.lock().broadcasts.push(broadcast.clone());
		Ok(broadcast)
	}

	async fn read_broadcast(&self, broadcast_id: &str) -> ClResult<Broadcast> {
		self.state
			.lock()
			.broadcasts
			.iter()
			.find(|b| &*b.broadcast_id == broadcast_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn append_recipient(
		&self,
		broadcast_id: &str,
		name: &str,
		email: &str,
		status: DeliveryStatus,
		sent_at: Option<Timestamp>,
	) -> ClResult<()> {
		let mut state = self.state.lock();
		state.next_recipient_id += 1;
		let recipient_id = state.next_recipient_id;
		state.recipients.push(RecipientRow {
			recipient_id,
			broadcast_id: broadcast_id.into(),
			name: name.into(),
			email: email.into(),
			status,
			sent_at,
			created_at: now(),
		});
		Ok(())
	}

	async fn list_recipients(&self, broadcast_id: &str) -> ClResult<Vec<RecipientRow>> {
		Ok(self
			.state
			.lock()
			.recipients
			.iter()
			.filter(|r| &*r.broadcast_id == broadcast_id)
			.cloned()
			.collect())
	}

	async fn resolve_pending_recipient(
		&self,
		broadcast_id: &str,
		email: &str,
		status: DeliveryStatus,
		sent_at: Option<Timestamp>,
	) -> ClResult<()> {
		let mut state = self.state.lock();
		for row in state.recipients.iter_mut().filter(|r| {
			&*r.broadcast_id == broadcast_id
				&& &*r.email == email
				&& r.status == DeliveryStatus::Pending
		}) {
			row.status = status;
			row.sent_at = sent_at;
		}
		Ok(())
	}

	async fn create_pending_emails(
		&self,
		broadcast_id: &str,
		rows: Vec<NewPendingEmail>,
	) -> ClResult<()> {
		let mut state = self.state.lock();
		let created_at = now();
		for row in rows {
			state.next_pending_id += 1;
			let pending_id = state.next_pending_id;
			state.pending.push(PendingEmail {
				pending_id,
				broadcast_id: broadcast_id.into(),
				name: row.name.into(),
				email: row.email.into(),
				subject: row.subject.into(),
				html: row.html.into(),
				certificate_filename: row.certificate_filename.into(),
				certificate: row.certificate,
				status: PendingStatus::Pending,
				scheduled_for: row.scheduled_for,
				attempts: 0,
				last_error: None,
				sent_at: None,
				created_at,
			});
		}
		Ok(())
	}

	async fn list_due_pending(&self, now: Timestamp, limit: u32) -> ClResult<Vec<PendingEmail>> {
		let mut due: Vec<PendingEmail> = self
			.state
			.lock()
			.pending
			.iter()
			.filter(|p| p.status == PendingStatus::Pending && p.scheduled_for <= now)
			.cloned()
			.collect();
		due.sort_by_key(|p| (p.created_at, p.pending_id));
		due.truncate(limit as usize);
		Ok(due)
	}

	async fn mark_pending_sent(&self, pending_id: i64, sent_at: Timestamp) -> ClResult<()> {
		let mut state = self.state.lock();
		if let Some(row) = state
			.pending
			.iter_mut()
			.find(|p| p.pending_id == pending_id && p.status == PendingStatus::Pending)
		{
			row.status = PendingStatus::Sent;
			row.sent_at = Some(sent_at);
			row.attempts += 1;
			row.last_error = None;
		}
		Ok(())
	}

	async fn mark_pending_retry(
		&self,
		pending_id: i64,
		attempts: i64,
		last_error: &str,
		scheduled_for: Timestamp,
	) -> ClResult<()> {
		let mut state = self.state.lock();
		if let Some(row) = state
			.pending
			.iter_mut()
			.find(|p| p.pending_id == pending_id && p.status == PendingStatus::Pending)
		{
			row.attempts = attempts;
			row.last_error = Some(last_error.into());
			row.scheduled_for = scheduled_for;
		}
		Ok(())
	}

	async fn mark_pending_failed(
		&self,
		pending_id: i64,
		attempts: i64,
		last_error: &str,
	) -> ClResult<()> {
		let mut state = self.state.lock();
		if let Some(row) = state
			.pending
			.iter_mut()
			.find(|p| p.pending_id == pending_id && p.status == PendingStatus::Pending)
		{
			// scheduled_for stays frozen on the terminal failure
			row.attempts = attempts;
			row.last_error = Some(last_error.into());
			row.status = PendingStatus::Failed;
		}
		Ok(())
	}

	async fn list_sender_profiles(&self) -> ClResult<Vec<SenderProfile>> {
		let mut profiles = self.state.lock().profiles.clone();
		profiles.sort_by_key(|p| std::cmp::Reverse(p.updated_at));
		Ok(profiles)
	}

	async fn upsert_default_sender_profile(
		&self,
		data: &SenderProfileData,
	) -> ClResult<SenderProfile> {
		let mut state = self.state.lock();
		state.profiles.retain(|p| &*p.profile_id != "default-selection");
		let profile = SenderProfile {
			profile_id: "default-selection".into(),
			name: data.name.clone().into(),
			department: data.department.clone().into(),
			contact: data.contact.clone().into(),
			updated_at: now(),
		};
		state.profiles.push(profile.clone());
		Ok(profile)
	}

	async fn create_sender_profile(&self, data: &SenderProfileData) -> ClResult<SenderProfile> {
		let profile = SenderProfile {
			profile_id: random_id().into(),
			name: data.name.clone().into(),
			department: data.department.clone().into(),
			contact: data.contact.clone().into(),
			updated_at: now(),
		};
		self.state.lock().profiles.push(profile.clone());
		Ok(profile)
	}

	async fn delete_sender_profile(&self, profile_id: &str) -> ClResult<()> {
		let mut state = self.state.lock();
		let before = state.profiles.len();
		state.profiles.retain(|p| &*p.profile_id != profile_id);
		if state.profiles.len() == before {
			return Err(Error::NotFound);
		}
		Ok(())
	}
}

// MockTransport //
//***************//

type SendHook = Box<dyn Fn(&OutgoingEmail) + Send + Sync>;

#[derive(Default)]
pub struct MockTransport {
	pub sent: Mutex<Vec<OutgoingEmail>>,
	fail_for: Mutex<HashSet<String>>,
	fail_all: Mutex<bool>,
	on_send: Mutex<Option<SendHook>>,
}

impl std::fmt::Debug for MockTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "MockTransport(sent: {})", self.sent.lock().len())
	}
}

impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn failing_for(emails: &[&str]) -> Arc<Self> {
		let transport = Self::default();
		*transport.fail_for.lock() = emails.iter().map(|e| e.to_string()).collect();
		Arc::new(transport)
	}

	pub fn failing_always() -> Arc<Self> {
		let transport = Self::default();
		*transport.fail_all.lock() = true;
		Arc::new(transport)
	}

	pub fn set_on_send(&self, hook: SendHook) {
		*self.on_send.lock() = Some(hook);
	}

	pub fn sent_to(&self) -> Vec<String> {
		self.sent.lock().iter().map(|e| e.to.clone()).collect()
	}
}

#[async_trait]
impl EmailTransport for MockTransport {
	async fn send(&self, email: &OutgoingEmail) -> ClResult<()> {
		if let Some(hook) = self.on_send.lock().as_ref() {
			hook(email);
		}
		if *self.fail_all.lock() || self.fail_for.lock().contains(&email.to) {
			return Err(Error::ServiceUnavailable("mock transport failure".into()));
		}
		self.sent.lock().push(email.clone());
		Ok(())
	}
}

// Fixtures //
//**********//

pub fn test_policy() -> DispatchPolicy {
	DispatchPolicy {
		provider: EmailProvider::Gmail,
		daily_safe_limit: 450,
		immediate_batch_limit: 20,
		pending_delay_hours: 24,
		inter_send_delay_ms: 0,
	}
}

pub fn test_sender() -> SenderIdentity {
	SenderIdentity {
		name: "Budi Santoso".into(),
		department: "Divisi Humas".into(),
		contact: "+62 812-3456-7890".into(),
	}
}

pub fn recipient(name: &str, email: &str) -> RecipientInput {
	RecipientInput { name: name.into(), email: email.into(), certificate: None }
}

pub fn recipients(count: usize) -> Vec<RecipientInput> {
	(1..=count).map(|i| recipient(&format!("Recipient {}", i), &format!("r{}@x.com", i))).collect()
}

pub fn test_input(recipients: Vec<RecipientInput>) -> BroadcastInput {
	BroadcastInput {
		recipients,
		default_certificate: Some(vec![1, 2, 3]),
		caption: "Terima kasih [Nama] telah mengikuti acara kami sampai selesai.".into(),
		event_name: "Webinar Nasional".into(),
		event_date: "Senin, 12 Januari 2026".into(),
		sender: test_sender(),
		youtube_url: None,
	}
}

pub fn build_dispatcher(
	store: Arc<MemoryStore>,
	transport: Arc<MockTransport>,
	cancellations: Arc<CancelRegistry>,
	policy: DispatchPolicy,
) -> Dispatcher {
	Dispatcher::new(
		store,
		transport,
		Arc::new(TemplateEngine::new().unwrap()),
		cancellations,
		policy,
	)
}

// vim: ts=4
