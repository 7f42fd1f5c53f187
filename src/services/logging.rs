//! Tracing subscriber setup.
//!
//! Logs go to stderr so the report summary on stdout stays readable.
//! `RUST_LOG` overrides the verbosity flags; `LOG_FORMAT=json` switches to
//! the JSON formatter.

use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How chatty the run should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Progress and warnings
    #[default]
    Normal,
    /// Section choice, per-candidate decisions, most watched titles
    Verbose,
    /// Every upstream request and response body
    Debug,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        match (verbose, debug) {
            (_, true) => Verbosity::Debug,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> &'static str {
        match self {
            Verbosity::Normal => "reclaimarr=info,warn",
            Verbosity::Verbose => "reclaimarr=debug,warn",
            Verbosity::Debug => "reclaimarr=trace,info",
        }
    }
}

/// Install the global subscriber. Call once, before any client is built.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in [Verbosity::Normal, Verbosity::Verbose, Verbosity::Debug] {
            assert!(EnvFilter::try_new(verbosity.default_directive()).is_ok());
        }
    }
}
