// Purpose: Tracing setup for applications embedding the engine

use anyhow::Result;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, format::FmtSpan, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Crates whose spans and events make up the engine's log output
pub const ENGINE_TARGETS: [&str; 2] = ["wrapline_engine", "wrapline_types"];

/// Filter directives that log the engine crates at `level` and everything
/// else at `warn`.
pub fn engine_directives(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(ENGINE_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Build a subscriber for the engine crates that writes to `writer`.
///
/// This is the hook for embedders that route engine logs somewhere other
/// than stdout, or that scope them with `tracing::subscriber::set_default`.
/// Resolution and invocation spans are reported when they close.
pub fn engine_subscriber<W>(
    level: &str,
    json_output: bool,
    writer: W,
) -> Result<Box<dyn Subscriber + Send + Sync>>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(engine_directives(level))?;
    Ok(layered(filter, json_output, writer))
}

/// Install the engine subscriber globally, writing to stdout.
///
/// `RUST_LOG` takes precedence over `log_level`, which defaults to `"info"`
/// and applies to the engine crates only.
pub fn init_tracing(log_level: Option<&str>, json_output: Option<bool>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(engine_directives(log_level.unwrap_or("info")))?,
    };
    let subscriber = layered(filter, json_output.unwrap_or(false), std::io::stdout);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn layered<W>(filter: EnvFilter, json_output: bool, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = Registry::default().with(filter);
    if json_output {
        let json_layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_span_list(true);
        Box::new(registry.with(json_layer))
    } else {
        let fmt_layer = fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true);
        Box::new(registry.with(fmt_layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_scope_level_to_engine_crates() {
        assert_eq!(
            engine_directives("debug"),
            "warn,wrapline_engine=debug,wrapline_types=debug"
        );
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(engine_subscriber("verbose", false, std::io::sink).is_err());
        assert!(engine_subscriber("trace", true, std::io::sink).is_ok());
    }

    #[test]
    fn test_second_init_is_refused() {
        let _ = init_tracing(Some("debug"), None);
        tracing::info!("tracing initialized");
        // A second global subscriber is refused rather than replacing the first
        assert!(init_tracing(Some("info"), Some(true)).is_err());
    }
}
