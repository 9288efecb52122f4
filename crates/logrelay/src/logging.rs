use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// HTTP stack crates whose debug output drowns the relay's own events.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "rustls"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Per-target filter: `self` for logrelay, capped at info for the HTTP stack.
    pub fn targets(self) -> Targets {
        let level = self.as_filter();
        let stack = level.min(LevelFilter::INFO);
        QUIET_TARGETS
            .iter()
            .fold(Targets::new().with_default(level), |targets, target| {
                targets.with_target(*target, stack)
            })
    }
}

/// Log to stderr; stdout is reserved for relayed bytes.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.finish().with(level.targets()).try_init(),
        LogFormat::Json => builder.json().finish().with(level.targets()).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn http_stack_is_capped_at_info() {
        let targets = LogLevel::Trace.targets();
        assert!(targets.would_enable("logrelay_server", &Level::TRACE));
        assert!(targets.would_enable("hyper_util::client", &Level::INFO));
        assert!(!targets.would_enable("hyper_util::client", &Level::DEBUG));
    }

    #[test]
    fn quieter_levels_apply_everywhere() {
        let targets = LogLevel::Warn.targets();
        assert!(!targets.would_enable("logrelay_server", &Level::INFO));
        assert!(!targets.would_enable("reqwest", &Level::INFO));
        assert!(targets.would_enable("reqwest", &Level::WARN));
    }
}
