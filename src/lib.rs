//! TableCRM mobile cashier — point-of-sale order entry client.
//!
//! Authenticates against the TableCRM commerce API with a bearer token,
//! derives the order form's selector lists from the sales-history listing
//! (the API has no dedicated reference endpoints for this client), lets an
//! operator assemble a multi-line sales order, and submits it as a draft
//! or as a posted transaction. See [`app::CashierApp`] for the operator
//! surface.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod app;
pub mod customers;
pub mod order;
pub mod reference;
pub mod session;
pub mod storage;
pub mod submit;

pub use app::{CashierApp, Screen};
pub use submit::SubmissionOutcome;

// ---------------------------------------------------------------------------
// Tolerant JSON helpers
// ---------------------------------------------------------------------------

/// First non-empty string found under any of `keys`.
pub(crate) fn value_str(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// First integer found under any of `keys`.
pub(crate) fn value_i64(v: &serde_json::Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        if let Some(n) = v.get(*key).and_then(|x| x.as_i64()) {
            return Some(n);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Initialize structured logging (console + daily rolling file).
///
/// Call once from the embedding shell before anything else runs. The file
/// appender guard is intentionally leaked so logs keep flushing until
/// process exit.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tablecrm_cashier=debug"));

    let log_dir = directories::ProjectDirs::from("com", "tablecrm", "tablecrm-cashier")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "cashier");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    std::mem::forget(guard);

    info!("tablecrm-cashier v{} logging initialized", env!("CARGO_PKG_VERSION"));
}
