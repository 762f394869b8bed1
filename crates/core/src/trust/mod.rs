//! Proof that traffic and TLS handshakes aimed at the loopback server really
//! belong to it.
//!
//! Both halves read the [TrustToken] from the host's [ServerTrust] at decision
//! time. When the server is not secured, or has no complete token, every check
//! resolves to the safe default: no header, no automatic trust.

mod headers;
mod verifier;

use log::warn;

pub use headers::{HeaderSink, RequestHeaderInjector, DEFAULT_USER_AGENT, TRUST_HEADER_PREFIX};
pub use verifier::{
    certificate_verdict_code, CertificateErrorDecision, CertificateVerdict, CertificateVerifier,
    ClientCertificateSelection,
};

use crate::callbacks::{ServerTrust, TrustToken};

impl TrustToken {
    /// Both halves of the header secret must be present for the token to be
    /// used at all.
    pub fn is_complete(&self) -> bool {
        !self.trust_key.is_empty() && !self.trust_val.is_empty()
    }
}

/// Reads the token for a single decision. Returns `None` unless the server is
/// secured and its token is complete.
pub(crate) fn active_token(server: &dyn ServerTrust) -> Option<TrustToken> {
    if !server.is_secured() {
        return None;
    }

    let token = server.server_info()?;

    if !token.is_complete() {
        warn!("Ignoring incomplete trust token for host {}", token.url_host);
        return None;
    }

    Some(token)
}

/// True if `url` lives under the server base url. An empty base url never matches.
pub(crate) fn is_server_url(server: &dyn ServerTrust, url: &str) -> bool {
    let base = server.server_url();
    !base.is_empty() && url.starts_with(base.as_str())
}
