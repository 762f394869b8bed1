use std::sync::Arc;

use log::debug;

use super::{active_token, is_server_url};
use crate::callbacks::{ClientCertificate, ServerTrust, TrustToken};

/// Outcome of a certificate verification request for a TLS handshake.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CertificateVerdict {
    /// Trust the certificate without further chain validation.
    Accept,
    /// Fail the handshake.
    Reject,
    /// Let the platform run its normal certificate validation.
    UsePlatformDefault,
}

impl CertificateVerdict {
    /// The numeric code Chromium-based shells expect from a verify callback.
    pub fn code(self) -> i32 {
        match self {
            CertificateVerdict::Accept => 0,
            CertificateVerdict::Reject => -2,
            CertificateVerdict::UsePlatformDefault => -3,
        }
    }
}

/// See [CertificateVerdict::code].
#[uniffi::export]
pub fn certificate_verdict_code(verdict: CertificateVerdict) -> i32 {
    verdict.code()
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum CertificateErrorDecision {
    /// Ignore the validation failure and continue loading.
    Override,
    /// Keep the original failure.
    Propagate { error: String },
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum ClientCertificateSelection {
    /// Answer the prompt with this certificate, without asking the user.
    AutoSelect { certificate: ClientCertificate },
    /// Fall back to the platform behavior (prompt or abstain).
    Default,
}

/// Decides how far TLS events are trusted based on the embedded server's
/// identity. Only that one server instance is ever trusted.
#[derive(Clone)]
pub struct CertificateVerifier {
    server: Option<Arc<dyn ServerTrust>>,
}

impl CertificateVerifier {
    pub fn new(server: Option<Arc<dyn ServerTrust>>) -> Self {
        Self { server }
    }

    pub fn verify_handshake(&self, hostname: &str) -> CertificateVerdict {
        let Some(token) = self.token() else {
            return CertificateVerdict::UsePlatformDefault;
        };

        if hostname == token.url_host {
            debug!("Trusting handshake with embedded server {hostname}");
            CertificateVerdict::Accept
        } else {
            CertificateVerdict::UsePlatformDefault
        }
    }

    pub fn certificate_error(&self, url: &str, error: String) -> CertificateErrorDecision {
        if self.trusts_url(url) {
            debug!("Overriding certificate error {error} for {url}");
            CertificateErrorDecision::Override
        } else {
            CertificateErrorDecision::Propagate { error }
        }
    }

    pub fn select_client_certificate(
        &self,
        url: &str,
        candidates: &[ClientCertificate],
    ) -> ClientCertificateSelection {
        debug!(
            "Client certificate requested by {url}, {} candidate(s)",
            candidates.len()
        );

        let Some(server) = self.server.as_deref() else {
            return ClientCertificateSelection::Default;
        };
        let Some(token) = active_token(server) else {
            return ClientCertificateSelection::Default;
        };

        if is_server_url(server, url) {
            ClientCertificateSelection::AutoSelect {
                certificate: ClientCertificate {
                    data: token.client_certificate,
                },
            }
        } else {
            ClientCertificateSelection::Default
        }
    }

    fn token(&self) -> Option<TrustToken> {
        active_token(self.server.as_deref()?)
    }

    fn trusts_url(&self, url: &str) -> bool {
        let Some(server) = self.server.as_deref() else {
            return false;
        };

        active_token(server).is_some() && is_server_url(server, url)
    }
}

impl std::fmt::Debug for CertificateVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateVerifier")
            .field("server", &self.server.is_some().then_some("..."))
            .finish()
    }
}
