//! Loading and validation of the TOML configuration file.

use std::path::Path;

use anyhow::{Context, bail};

use crate::Config;

pub(crate) fn load(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse configuration from {}", path.display()))?;

    validate(&config)?;

    log::debug!("Configuration loaded from {}", path.display());

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    let token = &config.token;

    match (&token.secret, &token.jwk) {
        (Some(_), Some(_)) => {
            bail!("token.secret and token.jwk are mutually exclusive")
        }
        (None, None) => {
            bail!("one of token.secret or token.jwk must be configured")
        }
        (Some(_), None) if !token.algorithm.is_symmetric() => {
            bail!(
                "token.secret is only valid with HMAC algorithms; {} requires token.jwk",
                token.algorithm.as_str()
            )
        }
        _ => Ok(()),
    }
}
