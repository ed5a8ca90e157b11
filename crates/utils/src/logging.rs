//! provides logging helpers

use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Directives used when `RUST_LOG` is unset. The HTTP stack under the
/// Kubernetes client is chatty at info level.
pub const DEFAULT_DIRECTIVES: &str = "info,kube=warn,hyper=warn,tower=warn,rustls=warn";

/// initiate the global tracing subscriber writing to stderr
pub fn init() {
    let env_filter = build_filter(std::env::var(filter::EnvFilter::DEFAULT_ENV).ok());

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    registry().with(fmt_layer).init();
}

fn build_filter(directives: Option<String>) -> filter::EnvFilter {
    filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .parse_lossy(directives.as_deref().unwrap_or(DEFAULT_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn defaults_to_info() {
        let env_filter = build_filter(None);
        assert_eq!(env_filter.max_level_hint(), Some(filter::LevelFilter::INFO));
    }

    #[test]
    fn rust_log_overrides_defaults() {
        let env_filter = build_filter(Some("old_pod_killer=debug".to_string()));
        assert_eq!(env_filter.max_level_hint(), Some(filter::LevelFilter::DEBUG));
    }

    #[test]
    fn invalid_directives_are_skipped() {
        let env_filter = build_filter(Some("old_pod_killer=notalevel".to_string()));
        assert_eq!(env_filter.max_level_hint(), Some(filter::LevelFilter::INFO));
    }
}
