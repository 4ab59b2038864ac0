use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout belongs to the dashboard itself.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("billing_dashboard=info,billing_client=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
