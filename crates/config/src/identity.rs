//! Identity resolution configuration.

use serde::Deserialize;

/// Settings mapping a verified token to a record in the identity store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// The claim holding the identity value. Dotted paths address nested
    /// claims (e.g. `user.name`).
    pub claim: String,

    /// The identity-store field the claim value is matched against.
    pub lookup_field: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            claim: "sub".to_string(),
            lookup_field: "id".to_string(),
        }
    }
}
