pub use crate::core::app::App;
pub use sertimail_types::error::{ClResult, Error};
pub use sertimail_types::types::{DeliveryStatus, PendingStatus, Timestamp, now};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
