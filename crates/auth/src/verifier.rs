//! Token verification against the configured algorithm and key material.
//!
//! The cryptography itself belongs to `jwt-compact`; this module binds it
//! to the deployment policy: one pinned algorithm, one key, optional
//! issuer/audience expectations, and a leeway for clock skew.

use anyhow::{Context, bail};
use chrono::Duration;
use config::{TokenAlgorithm, TokenConfig};
use jwt_compact::{Algorithm, AlgorithmExt, TimeOptions, Token, UntrustedToken, jwk::JsonWebKey};
use secrecy::{ExposeSecret, SecretString};

use crate::claims::TokenClaims;
use crate::error::DecodeError;

enum KeyMaterial {
    Secret(SecretString),
    Jwk(JsonWebKey<'static>),
}

/// Verifies and decodes inbound tokens.
pub struct TokenVerifier {
    algorithm: TokenAlgorithm,
    key: KeyMaterial,
    time_options: TimeOptions,
    expected_issuer: Option<String>,
    expected_audience: Option<String>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of Debug output.
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("expected_issuer", &self.expected_issuer)
            .field("expected_audience", &self.expected_audience)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Prepares a verifier from token configuration, failing fast on key
    /// material that cannot possibly verify anything.
    pub fn new(config: &TokenConfig) -> anyhow::Result<Self> {
        let key = match (&config.secret, &config.jwk) {
            (Some(_), Some(_)) => bail!("token.secret and token.jwk are mutually exclusive"),
            (None, None) => bail!("one of token.secret or token.jwk must be configured"),
            (Some(secret), None) => {
                if !config.algorithm.is_symmetric() {
                    bail!(
                        "token.secret is only valid with HMAC algorithms; {} requires token.jwk",
                        config.algorithm.as_str()
                    );
                }

                KeyMaterial::Secret(secret.clone())
            }
            (None, Some(value)) => {
                let jwk: JsonWebKey<'static> =
                    serde_json::from_value(value.clone()).context("token.jwk is not a valid JSON Web Key")?;

                KeyMaterial::Jwk(jwk)
            }
        };

        let time_options = match config.leeway {
            Some(leeway) => {
                let leeway = Duration::from_std(leeway).context("token.leeway is out of range")?;
                TimeOptions::from_leeway(leeway)
            }
            None => TimeOptions::default(),
        };

        Ok(Self {
            algorithm: config.algorithm,
            key,
            time_options,
            expected_issuer: config.expected_issuer.clone(),
            expected_audience: config.expected_audience.clone(),
        })
    }

    /// Verifies a token string and returns its custom claims.
    ///
    /// The `alg` header is pinned to the configured algorithm before any
    /// cryptography runs, then the signature, the time claims, and the
    /// configured issuer/audience expectations are checked in that order.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError> {
        let untrusted = UntrustedToken::new(token).map_err(|err| {
            log::debug!("Token rejected: malformed structure: {err}");
            DecodeError::Malformed
        })?;

        if untrusted.algorithm() != self.algorithm.as_str() {
            log::debug!(
                "Token rejected: algorithm {} does not match the configured {}",
                untrusted.algorithm(),
                self.algorithm.as_str()
            );
            return Err(DecodeError::AlgorithmMismatch(untrusted.algorithm().to_string()));
        }

        let token = self.verify_signature(&untrusted)?;
        let claims = token.claims();

        claims.validate_expiration(&self.time_options).map_err(|_| {
            log::debug!("Token rejected: expired");
            DecodeError::Expired
        })?;

        if claims.not_before.is_some() {
            claims.validate_maturity(&self.time_options).map_err(|_| {
                log::debug!("Token rejected: not yet valid");
                DecodeError::NotYetValid
            })?;
        }

        self.check_issuer(&claims.custom)?;
        self.check_audience(&claims.custom)?;

        Ok(claims.custom.clone())
    }

    fn verify_signature(&self, untrusted: &UntrustedToken<'_>) -> Result<Token<TokenClaims>, DecodeError> {
        use jwt_compact::alg::*;

        match &self.key {
            KeyMaterial::Secret(secret) => {
                let bytes = secret.expose_secret().as_bytes();

                match self.algorithm {
                    TokenAlgorithm::HS256 => validate(Hs256, &Hs256Key::new(bytes), untrusted),
                    TokenAlgorithm::HS384 => validate(Hs384, &Hs384Key::new(bytes), untrusted),
                    TokenAlgorithm::HS512 => validate(Hs512, &Hs512Key::new(bytes), untrusted),
                    // Construction rejects a raw secret for asymmetric algorithms.
                    _ => Err(DecodeError::Signature),
                }
            }
            KeyMaterial::Jwk(jwk) => match self.algorithm {
                TokenAlgorithm::HS256 => validate_jwk(Hs256, jwk, untrusted),
                TokenAlgorithm::HS384 => validate_jwk(Hs384, jwk, untrusted),
                TokenAlgorithm::HS512 => validate_jwk(Hs512, jwk, untrusted),
                TokenAlgorithm::ES256 => validate_jwk(Es256, jwk, untrusted),
                TokenAlgorithm::RS256 => validate_jwk(Rsa::rs256(), jwk, untrusted),
                TokenAlgorithm::RS384 => validate_jwk(Rsa::rs384(), jwk, untrusted),
                TokenAlgorithm::RS512 => validate_jwk(Rsa::rs512(), jwk, untrusted),
                TokenAlgorithm::PS256 => validate_jwk(Rsa::ps256(), jwk, untrusted),
                TokenAlgorithm::PS384 => validate_jwk(Rsa::ps384(), jwk, untrusted),
                TokenAlgorithm::PS512 => validate_jwk(Rsa::ps512(), jwk, untrusted),
                TokenAlgorithm::EdDSA => validate_jwk(Ed25519, jwk, untrusted),
            },
        }
    }

    fn check_issuer(&self, claims: &TokenClaims) -> Result<(), DecodeError> {
        let Some(expected) = &self.expected_issuer else {
            return Ok(());
        };

        match claims.issuer() {
            Some(issuer) if issuer == expected => Ok(()),
            Some(_) => {
                log::debug!("Token rejected: invalid issuer");
                Err(DecodeError::IssuerMismatch)
            }
            None => {
                log::debug!("Token rejected: missing issuer claim");
                Err(DecodeError::IssuerMismatch)
            }
        }
    }

    fn check_audience(&self, claims: &TokenClaims) -> Result<(), DecodeError> {
        let Some(expected) = &self.expected_audience else {
            return Ok(());
        };

        if claims.has_audience(expected) {
            Ok(())
        } else {
            log::debug!("Token rejected: audience validation failed");
            Err(DecodeError::AudienceMismatch)
        }
    }
}

fn validate<A: Algorithm>(
    alg: A,
    key: &A::VerifyingKey,
    untrusted: &UntrustedToken<'_>,
) -> Result<Token<TokenClaims>, DecodeError> {
    alg.validator(key).validate(untrusted).map_err(|err| {
        log::debug!("Token rejected: signature validation failed: {err}");
        DecodeError::Signature
    })
}

fn validate_jwk<A>(alg: A, jwk: &JsonWebKey<'_>, untrusted: &UntrustedToken<'_>) -> Result<Token<TokenClaims>, DecodeError>
where
    A: Algorithm,
    A::VerifyingKey: for<'a> TryFrom<&'a JsonWebKey<'a>>,
{
    let key = A::VerifyingKey::try_from(jwk).map_err(|_| {
        log::debug!("Token rejected: verification key does not fit the configured algorithm");
        DecodeError::Signature
    })?;

    validate(alg, &key, untrusted)
}
