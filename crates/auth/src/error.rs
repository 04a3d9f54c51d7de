//! Error taxonomy for the authentication path.
//!
//! Absence of a credential is not an error anywhere in this crate; it is
//! the `Ok(None)` arm of the backend result. Everything below only covers
//! a credential that was presented and could not be authenticated.

/// Failures verifying and decoding a presented token.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The token is not a structurally valid JWT.
    #[error("malformed token")]
    Malformed,
    /// The token's `alg` header differs from the configured algorithm.
    #[error("unexpected signing algorithm {0:?}")]
    AlgorithmMismatch(String),
    /// Signature verification failed.
    #[error("signature verification failed")]
    Signature,
    /// The token's expiration time has passed.
    #[error("token has expired")]
    Expired,
    /// The token's not-before time is in the future.
    #[error("token is not yet valid")]
    NotYetValid,
    /// The `iss` claim is missing or does not match the expected issuer.
    #[error("issuer validation failed")]
    IssuerMismatch,
    /// The `aud` claim does not contain the expected audience.
    #[error("audience validation failed")]
    AudienceMismatch,
}

/// A well-formed, verified token whose claims cannot identify anyone.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    /// The configured identity claim is absent from the token.
    #[error("token is missing the {0:?} claim")]
    MissingIdentityClaim(String),
}

/// Failures mapping a claim value to a record in the identity store.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// The claim value matches no known identity.
    #[error("no identity has {field} = {value:?}")]
    UnknownIdentity {
        /// The store field that was queried.
        field: String,
        /// The claim value that matched nothing.
        value: String,
    },
    /// The identity store itself failed.
    #[error("identity store lookup failed")]
    Store(#[source] StoreError),
}

/// An error reported by an [`IdentityStore`](crate::IdentityStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl StoreError {
    /// Wraps an arbitrary store-side error.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(source.into())
    }
}

/// The single failure kind surfaced to the authentication pipeline.
///
/// The backend performs no local recovery; every lower-level failure is
/// wrapped here and propagated, and the surrounding framework decides the
/// user-visible response.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The presented token failed verification or decoding.
    #[error("token rejected: {0}")]
    Token(#[from] DecodeError),
    /// The verified token does not carry a usable identity claim.
    #[error("token rejected: {0}")]
    Claims(#[from] ClaimsError),
    /// The identity lookup failed.
    #[error("authentication failed: {0}")]
    Resolution(#[from] ResolutionError),
}
