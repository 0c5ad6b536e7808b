use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings are shown, or
/// `default_verbose` (e.g. `deqar_tools=info`) when asked for more.
pub fn init(verbose: bool, default_verbose: &str) {
    let fallback = if verbose { default_verbose } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
