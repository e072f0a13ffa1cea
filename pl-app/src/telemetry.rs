//! Log subscriber and panic reporting for the `promptlight` binary.

use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const DEFAULT_FILTER: &str = "info,promptlight=debug,pl_app=debug,pl_core=debug,\
pl_store=debug,pl_tracking=debug,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }

    fn from_env_value(value: Option<String>) -> anyhow::Result<Self> {
        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse(),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(anyhow::anyhow!(
                "unsupported PROMPTLIGHT_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            )),
        }
    }
}

/// Installs the global subscriber. Output goes to stderr so one-shot
/// commands can print JSON on stdout.
pub fn init_tracing() -> anyhow::Result<LogFormat> {
    let format = LogFormat::from_env_value(std::env::var("PROMPTLIGHT_LOG_FORMAT").ok())?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(format_layer(format))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;

    tracing::info!(
        log_format = format.as_str(),
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(format)
}

fn format_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => base
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => base
            .with_thread_ids(true)
            .with_thread_names(true)
            .pretty()
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

/// Routes panics through `tracing` before the default hook runs.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(
            panic_location = %location,
            panic_payload = %panic_message(info.payload()),
            "panic captured"
        );
        default_hook(info);
    }));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_defaults_to_json() {
        assert_eq!(LogFormat::from_env_value(None).expect("unset"), LogFormat::Json);
        assert_eq!(
            LogFormat::from_env_value(Some("  ".to_string())).expect("blank"),
            LogFormat::Json
        );
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!(" Pretty ".parse::<LogFormat>().expect("pretty"), LogFormat::Pretty);
        assert_eq!("COMPACT".parse::<LogFormat>().expect("compact"), LogFormat::Compact);
        let err = "xml".parse::<LogFormat>().expect_err("xml is unsupported");
        assert!(err.to_string().contains("PROMPTLIGHT_LOG_FORMAT"));
    }

    #[test]
    fn panic_messages_are_extracted() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(boxed.as_ref()), "owned boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
