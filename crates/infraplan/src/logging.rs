//! Default `tracing` subscriber.
//!
//! ## Log Levels
//!
//! - **INFO**: solve start and end, with sizes, status and elapsed time
//! - **DEBUG**: strategy attempts, incumbents, forecasts
//! - **WARN**: fallbacks to weaker strategies or annotated-only results

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_DIRECTIVES: [&str; 2] = ["infraplan_solver=info", "infraplan_forecast=info"];

/// Installs a formatted subscriber filtered by `RUST_LOG`.
///
/// Safe to call multiple times; only the first call has effect, and an
/// already-installed global subscriber is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        let mut filter = EnvFilter::from_default_env();
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
            for directive in DEFAULT_DIRECTIVES {
                if let Ok(directive) = directive.parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init();
    });
}
