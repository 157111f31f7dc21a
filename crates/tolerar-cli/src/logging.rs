//! Logging setup
//!
//! Logs go to stderr so JSON reports on stdout stay parseable.

use crate::config::Verbosity;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub const fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "tolerar=error,tolerador=error,error",
        Verbosity::Normal => "tolerar=info,tolerador=info,warn",
        Verbosity::Verbose => "tolerar=debug,tolerador=debug,warn",
        Verbosity::Debug => "tolerar=trace,tolerador=trace,info",
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over the verbosity flags. Calling this
/// twice is harmless.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::Debug,
        ] {
            let directive = default_directive(verbosity);
            assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
        }
    }

    #[test]
    fn test_verbose_raises_library_level() {
        assert!(default_directive(Verbosity::Verbose).contains("tolerar=debug"));
        assert!(default_directive(Verbosity::Debug).contains("tolerar=trace"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Debug);
    }
}
