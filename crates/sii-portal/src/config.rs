//! Configuration for the portal client.

use std::time::Duration;

use reqwest::StatusCode;

/// The portal's session-termination endpoint.
pub const DEFAULT_TERMINATE_URL: &str = "https://zeusr.sii.cl/cgi_AUT2000/autTermino.cgi";

/// Default timeout for the termination request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How HTTP statuses from the termination endpoint are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationPolicy {
    /// Any HTTP response counts as success; only a transport-level failure
    /// (no response at all) is a failure. Matches the portal's observed
    /// behavior, where non-2xx answers still mean the request was
    /// processed, and keeps cache cleanup from blocking on ambiguous
    /// remote signals.
    #[default]
    Lenient,

    /// Only 2xx and 3xx responses count as success.
    Strict,
}

impl TerminationPolicy {
    /// Whether a received status counts as a successful close.
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            TerminationPolicy::Lenient => true,
            TerminationPolicy::Strict => status.is_success() || status.is_redirection(),
        }
    }
}

/// Settings for [`crate::PortalTerminator`].
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Termination endpoint URL.
    pub endpoint: String,

    /// Hard timeout on the outbound call.
    pub timeout: Duration,

    /// Skip TLS certificate verification. The portal's chain does not
    /// validate in all environments; the original integration ran with
    /// verification off.
    pub accept_invalid_certs: bool,

    /// Status-judging policy.
    pub policy: TerminationPolicy,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TERMINATE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: true,
            policy: TerminationPolicy::default(),
        }
    }
}

impl PortalConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the termination endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the status-judging policy.
    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}
