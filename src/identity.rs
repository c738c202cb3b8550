//! Identity provider boundary.
//!
//! The exchange only needs a stable opaque reference per signed-in
//! session. [`AnonymousIdentityProvider`] mints random references locally;
//! hosts with a real auth service implement [`IdentityProvider`] instead.

use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::exchange::{ExchangeError, Identity, Result};

/// Length of locally minted identity references.
const IDENTITY_LEN: usize = 28;

/// Issues identities for sessions.
pub trait IdentityProvider {
    /// Signs in anonymously, returning the session identity.
    ///
    /// Signing in again while signed in returns the same identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot issue an identity.
    fn sign_in_anonymously(&mut self) -> Result<Identity>;

    /// Currently signed-in identity.
    fn current(&self) -> Option<&Identity>;

    /// Ends the session. The identity is not reused afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot sign out.
    fn sign_out(&mut self) -> Result<()>;

    /// Current identity, or [`ExchangeError::NotSignedIn`].
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::NotSignedIn`] when nobody is signed in.
    fn require(&self) -> Result<&Identity> {
        self.current().ok_or(ExchangeError::NotSignedIn)
    }
}

/// Provider that mints random identities in process.
#[derive(Debug, Default)]
pub struct AnonymousIdentityProvider {
    current: Option<Identity>,
}

impl AnonymousIdentityProvider {
    /// Creates a signed-out provider.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }
}

impl IdentityProvider for AnonymousIdentityProvider {
    fn sign_in_anonymously(&mut self) -> Result<Identity> {
        if let Some(identity) = &self.current {
            return Ok(identity.clone());
        }

        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(IDENTITY_LEN)
            .map(char::from)
            .collect();
        let identity = Identity::new(id);
        info!("event=sign_in module=identity status=ok");
        self.current = Some(identity.clone());
        Ok(identity)
    }

    fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    fn sign_out(&mut self) -> Result<()> {
        if self.current.take().is_some() {
            info!("event=sign_out module=identity status=ok");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_is_stable_within_session() {
        let mut provider = AnonymousIdentityProvider::new();
        let first = provider.sign_in_anonymously().unwrap();
        let second = provider.sign_in_anonymously().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), IDENTITY_LEN);
        assert_eq!(provider.current(), Some(&first));
    }

    #[test]
    fn sign_out_invalidates_identity() {
        let mut provider = AnonymousIdentityProvider::new();
        let first = provider.sign_in_anonymously().unwrap();
        provider.sign_out().unwrap();

        assert!(provider.current().is_none());
        assert!(matches!(
            provider.require(),
            Err(ExchangeError::NotSignedIn)
        ));

        let second = provider.sign_in_anonymously().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn sign_out_when_signed_out_is_ok() {
        let mut provider = AnonymousIdentityProvider::new();
        assert!(provider.sign_out().is_ok());
    }
}
