use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Level used until the settings file has been read
const STARTUP_LEVEL: &str = "warn";

fn filter_or(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()))
}

fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .finish()
}

/// Run `f` with a temporary stderr logger, for work done before the
/// configured level is known (reading the settings file).
pub fn before_init<T>(f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(subscriber(filter_or(STARTUP_LEVEL), std::io::stderr), f)
}

/// Logs go to stderr; in bridge mode stdout belongs to the JSON-RPC peer.
/// `RUST_LOG` wins over the configured level.
pub fn init(configured_level: &str) {
    // A second init only happens in tests; keep the first subscriber
    let _ = tracing::subscriber::set_global_default(subscriber(
        filter_or(configured_level),
        std::io::stderr,
    ));
}
