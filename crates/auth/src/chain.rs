//! An ordered chain of authentication backends.

use std::sync::Arc;

use http::request::Parts;

use crate::backend::AuthenticationBackend;
use crate::error::AuthError;
use crate::store::Identity;

/// Backends tried in registration order.
///
/// A backend that abstains (`Ok(None)`) hands the request to the next one;
/// the first resolved identity wins. A failure stops the chain immediately
/// and propagates, so an invalid credential is never quietly retried
/// against weaker backends.
#[derive(Default, Clone)]
pub struct BackendChain {
    backends: Vec<Arc<dyn AuthenticationBackend>>,
}

impl BackendChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a backend to the end of the chain.
    pub fn push(&mut self, backend: Arc<dyn AuthenticationBackend>) {
        self.backends.push(backend);
    }

    /// Tries every backend in order without blocking the calling
    /// scheduler.
    pub async fn authenticate(&self, request: Option<&Parts>) -> Result<Option<Identity>, AuthError> {
        for backend in &self.backends {
            if let Some(identity) = backend.authenticate(request).await? {
                return Ok(Some(identity));
            }
        }

        Ok(None)
    }

    /// Tries every backend in order on the calling thread.
    pub fn authenticate_blocking(&self, request: Option<&Parts>) -> Result<Option<Identity>, AuthError> {
        for backend in &self.backends {
            if let Some(identity) = backend.authenticate_blocking(request)? {
                return Ok(Some(identity));
            }
        }

        Ok(None)
    }

    /// Asks every backend for a stored-key lookup; the first identity
    /// wins. With only stateless backends registered this is always
    /// absent.
    pub fn get_user(&self, id: &str) -> Option<Identity> {
        self.backends.iter().find_map(|backend| backend.get_user(id))
    }
}
