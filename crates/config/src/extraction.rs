//! Credential extraction configuration.

use serde::Deserialize;

/// Settings describing where the bearer credential lives in a request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// The header carrying the credential.
    ///
    /// Accepts either the HTTP form (`Authorization`) or the CGI-style form
    /// some deployment environments hand around (`HTTP_AUTHORIZATION`); the
    /// backend normalizes the latter at construction.
    pub header_name: String,

    /// The authentication scheme keyword preceding the token, compared
    /// case-insensitively.
    pub prefix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_name: "Authorization".to_string(),
            prefix: "Bearer".to_string(),
        }
    }
}
