mod app;
mod error;

pub mod alert_client;
pub mod config;
pub mod database;
pub mod email_client;
pub mod templ_manager;
pub mod utils;
pub mod web;

// re-exports
pub use alert_client::AlertClient;
pub use app::{App, AppState, InternalState};
pub use email_client::EmailClient;
pub use error::{Error, Result};
pub use web::serve;

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Compact console logging for local development.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .compact()
        .init();
}

/// JSON lines on stdout, one event per line, for the log collector.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}
