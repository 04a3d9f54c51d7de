//! Vestibule configuration structures to map the vestibule.toml configuration.

#![deny(missing_docs)]

mod extraction;
mod identity;
mod loader;
mod token;

use std::path::Path;

pub use extraction::ExtractionConfig;
pub use identity::IdentityConfig;
use serde::Deserialize;
pub use token::{TokenAlgorithm, TokenConfig};

/// Main configuration structure for a vestibule authentication backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Credential extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Token verification settings.
    pub token: TokenConfig,
    /// Identity resolution settings.
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path.as_ref())
    }

    /// Validates that the configuration describes a usable verification key.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}
