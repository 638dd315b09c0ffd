//! The termination call itself.

use async_trait::async_trait;
use reqwest::header;
use tracing::{info, warn};

use sii_session::{SessionRecord, SessionTerminator};

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const REFERER: &str = "https://misiir.sii.cl/";

/// Closes sessions against the portal's termination endpoint.
///
/// The endpoint authenticates by cookie: the cached `TOKEN` and
/// `CSESSIONID` plus the RUT cookies the portal's legacy stack expects.
/// Redirects are followed; the landing page content is irrelevant, only
/// that the portal answered.
pub struct PortalTerminator {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    config: PortalConfig,
}

impl PortalTerminator {
    /// Build the terminator and its HTTP client. Errors if the configured
    /// endpoint is not a valid URL.
    pub fn new(config: PortalConfig) -> Result<Self> {
        let endpoint = reqwest::Url::parse(&config.endpoint).map_err(|e| {
            PortalError::Config(format!("bad termination endpoint {:?}: {e}", config.endpoint))
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    fn cookie_header(record: &SessionRecord) -> String {
        format!(
            "TOKEN={}; CSESSIONID={}; RUT_NS={}; DV_NS={}; \
             NETSCAPE_LIVEWIRE.rut={}; NETSCAPE_LIVEWIRE.dv={}",
            record.token, record.csessionid, record.rut, record.dv, record.rut, record.dv
        )
    }
}

#[async_trait]
impl SessionTerminator for PortalTerminator {
    async fn terminate(&self, record: &SessionRecord) -> bool {
        let response = self
            .http
            .get(self.endpoint.clone())
            .header(header::COOKIE, Self::cookie_header(record))
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, ACCEPT)
            .header(header::REFERER, REFERER)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                let closed = self.config.policy.accepts(status);
                if status.is_success() || status.is_redirection() {
                    info!(rut = %record.rut, dv = %record.dv, %status, "session closed on the portal");
                } else if closed {
                    warn!(
                        rut = %record.rut,
                        dv = %record.dv,
                        %status,
                        "portal answered logout with an error status; treating as closed"
                    );
                } else {
                    warn!(rut = %record.rut, dv = %record.dv, %status, "portal rejected the logout");
                }
                closed
            }
            Err(e) => {
                warn!(rut = %record.rut, dv = %record.dv, error = %e, "logout request failed");
                false
            }
        }
    }
}
