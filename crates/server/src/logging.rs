use std::env;

use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer as _,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Targets that are chatty at `info` and rarely useful when tracing access
/// decisions. `RUST_LOG` directives are appended after these, so they win.
const QUIET_TARGETS: &[(&str, &str)] = &[("hyper", "warn"), ("h2", "warn"), ("tower", "warn")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines, one event per line.
    Json,
    /// Human-readable output for local runs.
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT=compact|text|pretty` selects compact output; anything else is JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("compact" | "text" | "pretty") => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

pub fn filter_directives(rust_log: Option<&str>) -> String {
    let mut directives = vec!["info".to_string()];
    directives.extend(
        QUIET_TARGETS
            .iter()
            .map(|(target, level)| format!("{target}={level}")),
    );
    if let Some(extra) = rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        directives.push(extra.to_string());
    }
    directives.join(",")
}

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let format = LogFormat::parse(env::var("LOG_FORMAT").ok().as_deref());
    let directives = filter_directives(env::var("RUST_LOG").ok().as_deref());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|error| {
        eprintln!("invalid RUST_LOG `{directives}`: {error}; falling back to `info`");
        EnvFilter::new("info")
    });

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("bogus")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" Compact ")), LogFormat::Compact);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Compact);
    }

    #[test]
    fn test_rust_log_directives_come_last() {
        assert_eq!(filter_directives(None), "info,hyper=warn,h2=warn,tower=warn");
        assert_eq!(
            filter_directives(Some("services=debug")),
            "info,hyper=warn,h2=warn,tower=warn,services=debug"
        );
        assert_eq!(filter_directives(Some("  ")), "info,hyper=warn,h2=warn,tower=warn");
        assert!(EnvFilter::try_new(filter_directives(Some("server=trace"))).is_ok());
    }
}
