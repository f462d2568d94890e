use tracing_subscriber::EnvFilter;

/// Log to stderr; stdout belongs to the protocol in server mode.
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "lifelog_mcp=debug"
    } else {
        "lifelog_mcp=warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
