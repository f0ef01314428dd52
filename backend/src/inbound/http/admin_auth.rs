//! Bearer-token guard for the admin endpoints.
//!
//! The configured token is hashed once at startup; requests are checked by
//! comparing SHA-256 digests so the plaintext token is never retained.

use std::fmt;

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::domain::Error;

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Digest of the configured admin token.
///
/// With no token configured every admin request is rejected.
#[derive(Clone, Default)]
pub struct AdminCredentials {
    digest: Option<[u8; 32]>,
}

impl AdminCredentials {
    /// Build credentials from the configured token; blank tokens disable
    /// admin access.
    pub fn from_token(token: Option<&str>) -> Self {
        let digest = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Sha256::digest(token.as_bytes()).into());
        Self { digest }
    }

    pub fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Short hex prefix of the digest, safe to log for rotation checks.
    pub fn fingerprint(&self) -> Option<String> {
        self.digest
            .map(|digest| hex::encode(digest).chars().take(12).collect())
    }

    fn verify(&self, presented: &str) -> bool {
        let Some(expected) = self.digest else {
            return false;
        };
        let actual: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        expected
            .iter()
            .zip(actual.iter())
            .fold(0_u8, |acc, (left, right)| acc | (left ^ right))
            == 0
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Extractor proving the request carried the admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
}

fn authorise(req: &HttpRequest) -> Result<AdminAccess, Error> {
    let Some(state) = req.app_data::<web::Data<HttpState>>() else {
        error!("admin guard used without HttpState registered");
        return Err(Error::internal("admin guard misconfigured"));
    };
    match bearer_token(req) {
        Some(token) if state.admin.verify(token) => Ok(AdminAccess),
        Some(_) => {
            debug!(path = req.path(), "admin token rejected");
            Err(Error::unauthorized("invalid admin token"))
        }
        None => Err(Error::unauthorized("admin bearer token required")),
    }
}

impl FromRequest for AdminAccess {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorise(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("s3cret"), "s3cret", true)]
    #[case(Some("s3cret"), "S3CRET", false)]
    #[case(Some("   "), "", false)]
    #[case(None, "anything", false)]
    fn verifies_against_configured_token(
        #[case] configured: Option<&str>,
        #[case] presented: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            AdminCredentials::from_token(configured).verify(presented),
            expected
        );
    }

    #[rstest]
    fn debug_output_hides_the_token() {
        let credentials = AdminCredentials::from_token(Some("s3cret"));

        let rendered = format!("{credentials:?}");

        assert!(!rendered.contains("s3cret"));
        assert_eq!(credentials.fingerprint().map(|f| f.len()), Some(12));
    }
}
