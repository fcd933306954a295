use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_DIRECTIVES: &str = "formdeck=info,form_spec=info,formdeck_store=info";

/// Picks the filter: an explicit level wins, then `RUST_LOG`, then the
/// crate defaults. A bare level such as `debug` applies to the formdeck
/// crates only.
pub fn filter_directives(level: Option<&str>, rust_log: Option<&str>) -> String {
    match (level, rust_log) {
        (Some(level), _) if is_bare_level(level) => {
            format!("formdeck={level},form_spec={level},formdeck_store={level}")
        }
        (Some(directives), _) => directives.to_string(),
        (None, Some(env)) if !env.trim().is_empty() => env.to_string(),
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}

fn is_bare_level(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
}

/// Installs the stderr subscriber. Repeated calls are no-ops.
pub fn init(level: Option<&str>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = filter_directives(level, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
