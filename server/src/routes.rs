use axum::{
	Router, middleware,
	routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::core::route_auth::require_auth;
use crate::prelude::*;
use crate::{analyze, broadcast, certificate, pending, sender};

pub fn init(app: App) -> Router {
	let protected_router = Router::new()
		.route("/api/analyze", post(analyze::post_analyze))
		.route("/api/broadcast", post(broadcast::handler::post_broadcast))
		.route("/api/broadcast/preview", post(broadcast::handler::post_preview))
		.route("/api/broadcast/test", post(broadcast::handler::post_test_email))
		.route("/api/broadcast/{id}/report", get(broadcast::handler::get_report))
		.route("/api/broadcast/{id}/cancel", post(broadcast::handler::post_cancel))
		.route("/api/certificates/check", post(certificate::post_check_matches))
		.route("/api/sender", get(sender::get_sender_profiles))
		.route("/api/sender", post(sender::post_sender_profile))
		.route("/api/sender/new", post(sender::post_new_sender_profile))
		.route("/api/sender/{id}", delete(sender::delete_sender_profile))
		.layer(middleware::from_fn_with_state(app.clone(), require_auth));

	// Gated by the shared cron secret instead of operator auth
	let cron_router =
		Router::new().route("/api/cron/process-pending", get(pending::handler::get_process_pending));

	Router::new()
		.merge(protected_router)
		.merge(cron_router)
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
