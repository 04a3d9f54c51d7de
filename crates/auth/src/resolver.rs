//! Identity resolution: mapping verified claims to a store record.

use std::sync::Arc;

use config::IdentityConfig;

use crate::claims::TokenClaims;
use crate::error::{AuthError, ClaimsError, ResolutionError, StoreError};
use crate::store::{Identity, IdentityStore};

/// Maps a verified token's identity claim to a record in the identity
/// store. Performs exactly one lookup per call and never caches.
pub struct IdentityResolver {
    claim: String,
    lookup_field: String,
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    /// Creates a resolver over the given store.
    pub fn new(config: &IdentityConfig, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            claim: config.claim.clone(),
            lookup_field: config.lookup_field.clone(),
            store,
        }
    }

    /// Reads the configured identity claim out of verified claims.
    ///
    /// This is the pure half of resolution, shared by both entry points;
    /// only the store call after it differs between them.
    fn claim_value(&self, claims: &TokenClaims) -> Result<String, ClaimsError> {
        claims
            .get_claim(&self.claim)
            .ok_or_else(|| ClaimsError::MissingIdentityClaim(self.claim.clone()))
    }

    /// Resolves verified claims to an identity without blocking the
    /// calling scheduler.
    pub async fn resolve(&self, claims: &TokenClaims) -> Result<Identity, AuthError> {
        let value = self.claim_value(claims)?;
        let found = self.store.find_by_field(&self.lookup_field, &value).await;

        Ok(self.finish(value, found)?)
    }

    /// Resolves verified claims to an identity on the calling thread.
    pub fn resolve_blocking(&self, claims: &TokenClaims) -> Result<Identity, AuthError> {
        let value = self.claim_value(claims)?;
        let found = self.store.find_by_field_blocking(&self.lookup_field, &value);

        Ok(self.finish(value, found)?)
    }

    /// Reconstructs an identity from a stored key alone: never succeeds.
    ///
    /// The token, not a stored reference, is the sole truth source for
    /// this backend; every authentication must re-present and re-verify
    /// a credential.
    pub fn reverse_resolve(&self, _key: &str) -> Option<Identity> {
        None
    }

    fn finish(
        &self,
        value: String,
        found: Result<Option<Identity>, StoreError>,
    ) -> Result<Identity, ResolutionError> {
        match found {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => {
                log::debug!("Authentication failed: no identity has {} = {value:?}", self.lookup_field);
                Err(ResolutionError::UnknownIdentity {
                    field: self.lookup_field.clone(),
                    value,
                })
            }
            Err(err) => {
                log::warn!("Identity store lookup failed: {err}");
                Err(ResolutionError::Store(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::DecodeError;
    use crate::store::InMemoryStore;

    struct BrokenStore;

    #[async_trait::async_trait]
    impl IdentityStore for BrokenStore {
        async fn find_by_field(&self, _field: &str, _value: &str) -> Result<Option<Identity>, StoreError> {
            Err(StoreError::new("connection refused"))
        }

        fn find_by_field_blocking(&self, _field: &str, _value: &str) -> Result<Option<Identity>, StoreError> {
            Err(StoreError::new("connection refused"))
        }
    }

    fn resolver_with(config: &str, store: Arc<dyn IdentityStore>) -> IdentityResolver {
        let config: config::Config = toml::from_str(config).unwrap();
        IdentityResolver::new(&config.identity, store)
    }

    fn default_resolver(store: Arc<dyn IdentityStore>) -> IdentityResolver {
        resolver_with(
            indoc::indoc! {r#"
                [token]
                algorithm = "HS256"
                secret = "test-secret"
            "#},
            store,
        )
    }

    fn alice_store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new(vec![Identity {
            id: "1".to_string(),
            username: "alice".to_string(),
        }]))
    }

    fn claims(value: serde_json::Value) -> TokenClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn resolves_subject_to_identity() {
        let resolver = default_resolver(alice_store());

        let identity = resolver.resolve_blocking(&claims(json!({ "sub": "1" }))).unwrap();
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn async_resolution_matches_blocking() {
        let resolver = default_resolver(alice_store());
        let claims = claims(json!({ "sub": "1" }));

        let async_identity = resolver.resolve(&claims).await.unwrap();
        let blocking_identity = resolver.resolve_blocking(&claims).unwrap();

        assert_eq!(async_identity, blocking_identity);
    }

    #[test]
    fn unknown_subject_is_a_resolution_error() {
        let resolver = default_resolver(alice_store());

        let error = resolver.resolve_blocking(&claims(json!({ "sub": "999" }))).unwrap_err();
        assert!(matches!(
            error,
            AuthError::Resolution(ResolutionError::UnknownIdentity { .. })
        ));
    }

    #[test]
    fn missing_claim_is_a_claims_error() {
        let resolver = default_resolver(alice_store());

        let error = resolver.resolve_blocking(&claims(json!({ "other": "1" }))).unwrap_err();
        assert!(matches!(
            error,
            AuthError::Claims(ClaimsError::MissingIdentityClaim(claim)) if claim == "sub"
        ));
    }

    #[test]
    fn store_failure_is_a_resolution_error() {
        let resolver = default_resolver(Arc::new(BrokenStore));

        let error = resolver.resolve_blocking(&claims(json!({ "sub": "1" }))).unwrap_err();
        assert!(matches!(error, AuthError::Resolution(ResolutionError::Store(_))));
    }

    #[test]
    fn configured_claim_and_field() {
        let resolver = resolver_with(
            indoc::indoc! {r#"
                [token]
                algorithm = "HS256"
                secret = "test-secret"

                [identity]
                claim = "username"
                lookup_field = "username"
            "#},
            alice_store(),
        );

        let identity = resolver
            .resolve_blocking(&claims(json!({ "username": "alice" })))
            .unwrap();
        assert_eq!(identity.id, "1");
    }

    #[test]
    fn reverse_resolution_is_always_absent() {
        let resolver = default_resolver(alice_store());

        assert_eq!(resolver.reverse_resolve("1"), None);
        assert_eq!(resolver.reverse_resolve("alice"), None);
        assert_eq!(resolver.reverse_resolve(""), None);
    }

    #[test]
    fn decode_errors_share_the_token_kind() {
        // ClaimsError and DecodeError both wrap into AuthError the same way.
        let claims_error: AuthError = ClaimsError::MissingIdentityClaim("sub".to_string()).into();
        let decode_error: AuthError = DecodeError::Signature.into();

        assert_eq!(claims_error.to_string(), "token rejected: token is missing the \"sub\" claim");
        assert_eq!(decode_error.to_string(), "token rejected: signature verification failed");
    }
}
