pub mod chat; // Session, backends, demo bot
pub mod client; // Request client: correlation ids, timeouts, retries
pub mod config;
pub mod format; // Message text to HTML, timestamps
pub mod models;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the
/// default filter. A second call is a no-op.
pub fn init_tracing() {
    install_subscriber(config::default_log_filter());
}

/// Like [`init_tracing`], with the fallback filter taken from `config`.
pub fn init_tracing_for(config: &config::ChatConfig) {
    install_subscriber(config.log_filter());
}

fn install_subscriber(fallback: String) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} starting", config::APP_NAME, config::APP_VERSION);
    }
}
