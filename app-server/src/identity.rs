use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::header::InvalidHeaderName;

/// Resolves the signed-in learner for a request.
pub trait IdentityProvider: Send + Sync {
    fn user_id(&self, headers: &HeaderMap) -> Option<String>;
}

/// Trusts a header set by the authenticating proxy in front of the server.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(header.trim().as_bytes())?,
        })
    }
}

impl IdentityProvider for HeaderIdentity {
    fn user_id(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(&self.header)?.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}
