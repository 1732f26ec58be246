use tracing_subscriber::{fmt, EnvFilter};

/// Installs a `fmt` subscriber filtered at `level`; `RUST_LOG` takes
/// precedence when set.
///
/// Returns `false` when the host application already installed a global
/// subscriber.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).try_init().is_ok()
}
