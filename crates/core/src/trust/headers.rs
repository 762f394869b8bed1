use std::{collections::HashMap, sync::Arc};

use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::active_token;
use crate::{callbacks::ServerTrust, error::ShellError};

/// Prefix of the secret header the loopback server looks for.
pub const TRUST_HEADER_PREFIX: &str = "X-Debug-";

/// Marker identifying traffic issued by the shell itself.
pub const DEFAULT_USER_AGENT: &str = "R2";

const USER_AGENT: &str = "User-Agent";

/// Anything outbound request headers can be written into.
pub trait HeaderSink {
    /// Sets `name` to `value`, replacing any previous value of the same
    /// header regardless of case.
    fn insert_header(&mut self, name: &str, value: &str) -> Result<(), ShellError>;
}

impl HeaderSink for HeaderMap {
    fn insert_header(&mut self, name: &str, value: &str) -> Result<(), ShellError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.insert(name, value);
        Ok(())
    }
}

// Header dictionaries handed over by the host keep the exact casing we write.
impl HeaderSink for HashMap<String, String> {
    fn insert_header(&mut self, name: &str, value: &str) -> Result<(), ShellError> {
        self.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.insert(name.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Stamps outbound requests so the loopback server can recognize the shell.
#[derive(Clone)]
pub struct RequestHeaderInjector {
    server: Option<Arc<dyn ServerTrust>>,
    user_agent: String,
}

impl RequestHeaderInjector {
    pub fn new(server: Option<Arc<dyn ServerTrust>>, user_agent: impl Into<String>) -> Self {
        Self {
            server,
            user_agent: user_agent.into(),
        }
    }

    /// The `X-Debug-<trust_key>` header pair, when the server is secured.
    pub fn trust_header(&self) -> Option<(String, String)> {
        let token = active_token(self.server.as_deref()?)?;
        Some((
            format!("{TRUST_HEADER_PREFIX}{}", token.trust_key),
            token.trust_val,
        ))
    }

    /// Writes the user agent marker and, in secured mode, the trust header.
    /// Returns whether the trust header was added. Never fails: headers that
    /// cannot be represented are logged and skipped.
    pub fn inject<H: HeaderSink + ?Sized>(&self, headers: &mut H) -> bool {
        if let Err(e) = headers.insert_header(USER_AGENT, &self.user_agent) {
            error!("Failed to set the shell user agent: {e}");
        }

        let Some((name, value)) = self.trust_header() else {
            return false;
        };

        match headers.insert_header(&name, &value) {
            Ok(()) => {
                debug!("Attached trust header {name}");
                true
            }
            Err(e) => {
                error!("Failed to attach trust header {name}: {e}");
                false
            }
        }
    }

    /// Headers for requests the shell issues through its own http clients.
    pub fn header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.inject(&mut headers);
        headers
    }
}

impl std::fmt::Debug for RequestHeaderInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHeaderInjector")
            .field("server", &self.server.is_some().then_some("..."))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
