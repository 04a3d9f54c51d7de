//! Token verification configuration.

use std::time::Duration;

use duration_str::deserialize_option_duration;
use secrecy::SecretString;
use serde::Deserialize;

/// Signing algorithms accepted for inbound tokens.
///
/// The configured algorithm is pinned: tokens presenting any other `alg`
/// header are rejected before signature verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TokenAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
    /// ECDSA with the P-256 curve.
    ES256,
    /// RSA PKCS#1 v1.5 with SHA-256.
    RS256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    RS384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    RS512,
    /// RSA-PSS with SHA-256.
    PS256,
    /// RSA-PSS with SHA-384.
    PS384,
    /// RSA-PSS with SHA-512.
    PS512,
    /// Edwards-curve signatures (Ed25519).
    EdDSA,
}

impl TokenAlgorithm {
    /// Whether the algorithm uses a shared secret rather than a key pair.
    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    /// The standard `alg` header value for this algorithm.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::ES256 => "ES256",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::EdDSA => "EdDSA",
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// The signing algorithm inbound tokens must use.
    pub algorithm: TokenAlgorithm,

    /// Shared secret for HMAC algorithms. Mutually exclusive with `jwk`.
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Verification key in JSON Web Key form. Kept as a raw value here;
    /// the backend interprets it against the configured algorithm.
    #[serde(default)]
    pub jwk: Option<serde_json::Value>,

    /// Expected issuer (`iss` claim). Unset skips the check.
    #[serde(default)]
    pub expected_issuer: Option<String>,

    /// Expected audience (`aud` claim). Unset skips the check.
    #[serde(default)]
    pub expected_audience: Option<String>,

    /// Clock-skew tolerance for time-based claims.
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub leeway: Option<Duration>,
}
