//! Executes `HttpRequest` values against the network.
//!
//! `Transport` is the only seam that performs I/O. `UreqTransport` keeps a
//! single reusable `ureq::Agent`; everything else about a call (URL, headers,
//! body) comes from the request. Status codes are never turned into errors
//! here: a 4xx or 5xx is a successfully transported response.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs exactly one round-trip per call.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        // Status codes are interpreted by the façade, not by the agent.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .user_agent(config.user_agent.as_str())
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method;
        debug!(%method, url = %request.url, "sending request");

        let sent = match (method, request.body.as_deref()) {
            (HttpMethod::Get, _) => decorate(self.agent.get(&request.url), &request).call(),
            (HttpMethod::Patch, Some(body)) => {
                decorate(self.agent.patch(&request.url), &request).send(body)
            }
            (HttpMethod::Patch, None) => {
                decorate(self.agent.patch(&request.url), &request).send_empty()
            }
            (HttpMethod::Post, Some(body)) => {
                decorate(self.agent.post(&request.url), &request).send(body)
            }
            (HttpMethod::Post, None) => {
                decorate(self.agent.post(&request.url), &request).send_empty()
            }
        };

        let mut response = sent.map_err(|e| {
            warn!(%method, url = %request.url, error = %e, "transport failure");
            TransportError::new(method, request.url.as_str(), e)
        })?;

        let status = response.status().as_u16();
        // The response, and with it the connection, is released when it
        // drops at the end of this scope, whether or not the read succeeded.
        let body = response.body_mut().read_to_vec().map_err(|e| {
            warn!(%method, url = %request.url, status, error = %e, "failed to read response body");
            TransportError::new(method, request.url.as_str(), e)
        })?;

        debug!(%method, url = %request.url, status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}
