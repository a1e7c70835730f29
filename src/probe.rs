//! General internet reachability probe
//!
//! Reachability is a signal, not an error: every failure mode of the request
//! (DNS, refused connection, TLS, timeout) simply reads as "not reachable".

use crate::config::ProbeConfig;
use reqwest::Client;
use tracing::debug;

#[allow(async_fn_in_trait)]
pub trait Reachability {
    /// Whether an outbound request currently succeeds
    async fn probe(&self) -> bool;
}

/// Probe that issues one GET against a well-known HTTPS endpoint
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

impl Reachability for HttpProbe {
    async fn probe(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                debug!("Reachability probe {} -> {}", self.url, response.status());
                true
            }
            Err(e) => {
                debug!("Reachability probe {} failed: {}", self.url, e);
                false
            }
        }
    }
}
