//! Log output setup

use anyhow::{anyhow, Result};
use orgs_types::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level.
pub(crate) fn init(config: Option<&LoggingConfig>) -> Result<()> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);
    if config.json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow!("failed to init logging: {e}"))
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow!("failed to init logging: {e}"))
    }
}
