//! Bearer credential verification.
//!
//! Sign-in itself happens at the external identity provider; this side only
//! checks the short-lived credential attached to each request. Credentials
//! are verified fresh on every call and never cached.

use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The authenticated principal as attested by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityCustomClaims {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Clone)]
pub struct IdentityVerifier {
    key: Arc<HS256Key>,
}

impl IdentityVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: Arc::new(HS256Key::from_bytes(secret)),
        }
    }

    /// Expects IDENTITY_JWT_SECRET to hold the shared secret the identity
    /// provider signs session credentials with.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("IDENTITY_JWT_SECRET").expect("IDENTITY_JWT_SECRET must be set");
        Self::new(secret.as_bytes())
    }

    /// Verifies signature and expiry and extracts the principal. The
    /// subject claim is the identity key everything downstream is keyed
    /// on, so a credential without one is rejected outright.
    pub fn verify(&self, token: &str) -> Result<Identity, jwt_simple::Error> {
        let claims = self
            .key
            .verify_token::<IdentityCustomClaims>(token, None)?;

        let uid = claims
            .subject
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| jwt_simple::Error::msg("credential does not attest a subject"))?;

        Ok(Identity {
            uid,
            email: claims.custom.email,
            display_name: claims.custom.name,
        })
    }

    /// Mints a credential the way the provider would. Used by local
    /// tooling and the integration tests; production traffic always
    /// carries provider-issued tokens.
    pub fn issue(
        &self,
        uid: &str,
        email: &str,
        display_name: Option<&str>,
        ttl_secs: u64,
    ) -> Result<String, jwt_simple::Error> {
        let custom = IdentityCustomClaims {
            email: email.to_string(),
            name: display_name.map(str::to_string),
        };
        let claims = Claims::with_custom_claims(custom, Duration::from_secs(ttl_secs))
            .with_subject(uid.to_string());
        self.key.authenticate(claims)
    }
}
