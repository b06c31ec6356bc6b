pub use tracing::Level;
use tracing::{
    Subscriber,
    level_filters::LevelFilter,
    subscriber::{DefaultGuard, set_default},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};
use tracing_tree::HierarchicalLayer;

/// Environment variable consulted by [`setup_tracing_from_env`].
pub const LOG_ENV: &str = "TYRES_LOG";

/// Installs a thread-local subscriber filtered by an `EnvFilter` directive such
/// as `hir::analysis::ty=trace`. Dropping the guard uninstalls it.
pub fn setup_tracing_with_filter(filter: &str) -> DefaultGuard {
    let subscriber = default_subscriber().with(EnvFilter::new(filter));
    set_default(subscriber)
}

pub fn setup_tracing(level: Level) -> DefaultGuard {
    let subscriber = default_subscriber().with(LevelFilter::from_level(level));
    set_default(subscriber)
}

/// Like [`setup_tracing_with_filter`], reading the directive from
/// `TYRES_LOG`. Logging is off when the variable is unset.
pub fn setup_tracing_from_env() -> DefaultGuard {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
    setup_tracing_with_filter(&filter)
}

fn default_subscriber() -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry().with(
        HierarchicalLayer::new(2)
            .with_targets(true)
            .with_indent_lines(true)
            .with_bracketed_fields(true)
            .with_ansi(false)
            .with_writer(std::io::stderr),
    )
}
