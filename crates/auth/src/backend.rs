//! The authentication backend orchestrator.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use config::Config;
use http::header::HeaderName;
use http::request::Parts;

use crate::claims::TokenClaims;
use crate::error::AuthError;
use crate::extract;
use crate::resolver::IdentityResolver;
use crate::store::{Identity, IdentityStore};
use crate::verifier::TokenVerifier;

/// The framework-pluggable authentication contract.
///
/// A backend either produces an identity, abstains (`Ok(None)`) so the
/// next backend in the chain may try, or fails. Absence of a credential
/// is always abstention, never failure; a presented-but-invalid
/// credential is always failure, never abstention.
#[async_trait]
pub trait AuthenticationBackend: Send + Sync {
    /// Authenticates a request without blocking the calling scheduler.
    ///
    /// Dropping the returned future abandons the attempt; no partial
    /// state is kept anywhere.
    async fn authenticate(&self, request: Option<&Parts>) -> Result<Option<Identity>, AuthError>;

    /// Authenticates a request entirely on the calling thread.
    ///
    /// Observably identical to [`authenticate`](Self::authenticate) for
    /// the same input.
    fn authenticate_blocking(&self, request: Option<&Parts>) -> Result<Option<Identity>, AuthError>;

    /// Looks up an identity from a stored key alone.
    fn get_user(&self, id: &str) -> Option<Identity>;
}

/// Stateless JWT authentication backend.
///
/// Per call: extract the bearer credential from the configured header,
/// verify and decode it, resolve the identity claim against the store.
/// Nothing is carried between calls.
pub struct JwtBackend {
    header_name: HeaderName,
    prefix: String,
    verifier: TokenVerifier,
    resolver: IdentityResolver,
}

impl JwtBackend {
    /// Builds a backend from configuration and an identity store.
    pub fn new(config: &Config, store: Arc<dyn IdentityStore>) -> anyhow::Result<Self> {
        let header_name = extract::normalize_header_name(&config.extraction.header_name)
            .parse::<HeaderName>()
            .with_context(|| format!("invalid extraction.header_name {:?}", config.extraction.header_name))?;

        let verifier = TokenVerifier::new(&config.token)?;
        let resolver = IdentityResolver::new(&config.identity, store);

        Ok(Self {
            header_name,
            prefix: config.extraction.prefix.clone(),
            verifier,
            resolver,
        })
    }

    /// The pure decision core shared by both entry points: everything up
    /// to, but not including, the identity-store lookup.
    fn decoded_claims(&self, request: Option<&Parts>) -> Result<Option<TokenClaims>, AuthError> {
        let Some(request) = request else {
            return Ok(None);
        };

        let Some(token) = extract::extract_credential(&request.headers, &self.header_name, &self.prefix) else {
            return Ok(None);
        };

        Ok(Some(self.verifier.decode(token)?))
    }
}

#[async_trait]
impl AuthenticationBackend for JwtBackend {
    async fn authenticate(&self, request: Option<&Parts>) -> Result<Option<Identity>, AuthError> {
        match self.decoded_claims(request)? {
            Some(claims) => Ok(Some(self.resolver.resolve(&claims).await?)),
            None => Ok(None),
        }
    }

    fn authenticate_blocking(&self, request: Option<&Parts>) -> Result<Option<Identity>, AuthError> {
        match self.decoded_claims(request)? {
            Some(claims) => Ok(Some(self.resolver.resolve_blocking(&claims)?)),
            None => Ok(None),
        }
    }

    /// Always absent: the backend never reconstructs an identity from a
    /// stored key; every authentication re-presents and re-verifies a
    /// token.
    fn get_user(&self, id: &str) -> Option<Identity> {
        self.resolver.reverse_resolve(id)
    }
}

#[cfg(test)]
mod tests {
    use std::mem::discriminant;

    use chrono::Duration;
    use indoc::indoc;
    use jwt_compact::alg::{Hs256, Hs256Key};
    use jwt_compact::{AlgorithmExt, Claims, Header, TimeOptions};
    use serde_json::json;

    use super::*;
    use crate::error::DecodeError;
    use crate::store::InMemoryStore;

    const SECRET: &str = "test-secret-key";

    fn backend(config: &str) -> JwtBackend {
        let config: Config = toml::from_str(config).unwrap();
        let store = Arc::new(InMemoryStore::new(vec![
            Identity {
                id: "1".to_string(),
                username: "alice".to_string(),
            },
            Identity {
                id: "2".to_string(),
                username: "bob".to_string(),
            },
        ]));

        JwtBackend::new(&config, store).unwrap()
    }

    fn default_backend() -> JwtBackend {
        backend(indoc! {r#"
            [token]
            algorithm = "HS256"
            secret = "test-secret-key"
        "#})
    }

    fn token_for(custom: serde_json::Value) -> String {
        let claims: TokenClaims = serde_json::from_value(custom).unwrap();
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), Duration::hours(1));
        let key = Hs256Key::new(SECRET.as_bytes());

        Hs256.token(&Header::empty(), &claims, &key).unwrap()
    }

    fn request(header: Option<&str>) -> Parts {
        let mut builder = http::Request::builder().uri("/");

        if let Some(value) = header {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }

        builder.body(()).unwrap().into_parts().0
    }

    /// Both entry points must agree on every fixture; success compares
    /// identities, failure compares error kinds.
    async fn authenticate_both(backend: &JwtBackend, request: Option<&Parts>) -> Result<Option<Identity>, AuthError> {
        let async_outcome = backend.authenticate(request).await;
        let blocking_outcome = backend.authenticate_blocking(request);

        match (&async_outcome, &blocking_outcome) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(a), Err(b)) => assert_eq!(discriminant(a), discriminant(b)),
            (a, b) => assert_eq!(a.is_ok(), b.is_ok(), "entry points disagree: {a:?} vs {b:?}"),
        }

        async_outcome
    }

    #[tokio::test]
    async fn authenticates_a_valid_token() {
        let backend = default_backend();
        let token = token_for(json!({ "sub": "1" }));
        let request = request(Some(&format!("Bearer {token}")));

        let identity = authenticate_both(&backend, Some(&request)).await.unwrap().unwrap();
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn invalid_token_fails() {
        let backend = default_backend();
        let request = request(Some("Bearer invalid"));

        let error = authenticate_both(&backend, Some(&request)).await.unwrap_err();
        assert!(matches!(error, AuthError::Token(_)));
    }

    #[tokio::test]
    async fn tampered_signature_fails() {
        let backend = default_backend();

        let other_key = Hs256Key::new(b"a-completely-different-key");
        let claims: TokenClaims = serde_json::from_value(json!({ "sub": "1" })).unwrap();
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), Duration::hours(1));
        let token = Hs256.token(&Header::empty(), &claims, &other_key).unwrap();
        let request = request(Some(&format!("Bearer {token}")));

        let error = authenticate_both(&backend, Some(&request)).await.unwrap_err();
        assert!(matches!(error, AuthError::Token(DecodeError::Signature)));
    }

    #[tokio::test]
    async fn null_request_abstains() {
        let backend = default_backend();

        let outcome = authenticate_both(&backend, None).await.unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn missing_header_abstains() {
        let backend = default_backend();
        let request = request(None);

        let outcome = authenticate_both(&backend, Some(&request)).await.unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn wrong_scheme_abstains() {
        let backend = default_backend();
        let request = request(Some("Basic dGVzdDp0ZXN0"));

        let outcome = authenticate_both(&backend, Some(&request)).await.unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn unknown_subject_fails() {
        let backend = default_backend();
        let token = token_for(json!({ "sub": "999" }));
        let request = request(Some(&format!("Bearer {token}")));

        let error = authenticate_both(&backend, Some(&request)).await.unwrap_err();
        assert!(matches!(error, AuthError::Resolution(_)));
    }

    #[tokio::test]
    async fn missing_identity_claim_fails() {
        let backend = default_backend();
        let token = token_for(json!({ "role": "admin" }));
        let request = request(Some(&format!("Bearer {token}")));

        let error = authenticate_both(&backend, Some(&request)).await.unwrap_err();
        assert!(matches!(error, AuthError::Claims(_)));
    }

    #[tokio::test]
    async fn jwt_prefix_scenario_resolves_alice() {
        let backend = backend(indoc! {r#"
            [extraction]
            prefix = "JWT"

            [token]
            algorithm = "HS256"
            secret = "test-secret-key"

            [identity]
            claim = "username"
            lookup_field = "username"
        "#});

        let token = token_for(json!({ "username": "alice" }));
        let request = request(Some(&format!("JWT {token}")));

        let identity = authenticate_both(&backend, Some(&request)).await.unwrap().unwrap();
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn jwt_prefix_scenario_rejects_garbage() {
        let backend = backend(indoc! {r#"
            [extraction]
            prefix = "JWT"

            [token]
            algorithm = "HS256"
            secret = "test-secret-key"
        "#});

        let request = request(Some("JWT invalid"));

        let error = authenticate_both(&backend, Some(&request)).await.unwrap_err();
        assert!(matches!(error, AuthError::Token(_)));
    }

    #[tokio::test]
    async fn cgi_style_header_name_still_matches() {
        let backend = backend(indoc! {r#"
            [extraction]
            header_name = "HTTP_AUTHORIZATION"

            [token]
            algorithm = "HS256"
            secret = "test-secret-key"
        "#});

        let token = token_for(json!({ "sub": "2" }));
        let request = request(Some(&format!("Bearer {token}")));

        let identity = authenticate_both(&backend, Some(&request)).await.unwrap().unwrap();
        assert_eq!(identity.username, "bob");
    }

    #[test]
    fn get_user_is_always_absent() {
        let backend = default_backend();

        assert_eq!(backend.get_user("1"), None);
        assert_eq!(backend.get_user("alice"), None);
        assert_eq!(backend.get_user("unknown"), None);
    }

    #[test]
    fn invalid_header_name_fails_construction() {
        let config: Config = toml::from_str(indoc! {r#"
            [extraction]
            header_name = "not a header"

            [token]
            algorithm = "HS256"
            secret = "test-secret-key"
        "#})
        .unwrap();

        let store = Arc::new(InMemoryStore::default());
        assert!(JwtBackend::new(&config, store).is_err());
    }
}
