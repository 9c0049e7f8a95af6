//! Authentication module
//!
//! Optional pass-through header check. The gateway performs no token
//! parsing or verification; it only requires that a non-empty
//! `Authorization` header is present when the check is enabled.

use thiserror::Error;

use crate::config::AuthConfig;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
}

/// Pass-through header authenticator
#[derive(Debug, Clone)]
pub struct HeaderAuthenticator {
    enabled: bool,
}

impl HeaderAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }

    /// Check the `Authorization` header of a request.
    ///
    /// Always passes when the check is disabled.
    pub fn check(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        if !self.enabled {
            return Ok(());
        }
        match authorization {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(AuthError::MissingAuth),
        }
    }
}
