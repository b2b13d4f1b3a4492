pub mod config;

#[doc(hidden)]
pub use tracing_subscriber as __tracing_subscriber;

/// Install the global `tracing` subscriber.
///
/// Reads `RUST_LOG` and falls back to `info` for everything.
#[macro_export]
macro_rules! init_tracing {
    () => {{
        use $crate::__tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| ::anyhow::anyhow!("failed to install tracing subscriber: {e}"))
    }};
}
