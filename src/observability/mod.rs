//! Observability
//!
//! Structured logging through `tracing`. Verbosity comes from `RUST_LOG`,
//! falling back to `filevault=info` plus request spans from `tower_http`.
//!
//! Usernames are only logged at `debug`; `info` and above carry user ids.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "filevault=info,tower_http=info";

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
