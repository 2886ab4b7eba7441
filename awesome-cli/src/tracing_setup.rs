//! Tracing setup for the awesome CLI
//!
//! Usage:
//!   awesome --debug ...              # Debug logging to console
//!   RUST_LOG=awesome_orm=debug awesome  # Fine-grained log control

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Log SQL arguments and registration details
    pub debug: bool,
}

/// Filter used when `RUST_LOG` is not set. The ORM logs every statement
/// at info; sqlx's own per-query logs stay quiet unless debugging.
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "awesome=debug,awesome_orm=debug,sqlx=info,warn"
    } else {
        "awesome=info,awesome_orm=info,sqlx=warn,warn"
    }
}

/// Initialize console tracing on stderr so command output stays clean
pub fn init(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(config.debug)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.debug)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for debug in [false, true] {
            let directives = default_directives(debug);
            assert!(EnvFilter::try_new(directives).is_ok(), "{}", directives);
        }
        assert!(default_directives(false).contains("awesome_orm=info"));
        assert!(default_directives(true).contains("awesome_orm=debug"));
    }
}
