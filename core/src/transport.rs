//! Blocking ureq transport, driven from tokio's blocking pool.
//!
//! # Design
//! ureq is configured with `http_status_as_error(false)` so 4xx/5xx come
//! back as data and the runner does all status interpretation. Each send
//! runs on `spawn_blocking`, keeping async worker threads free.
//!
//! Bodies of non-2xx responses are never read. 2xx bodies are read up to
//! `TransportConfig::max_body` (unbounded by default) instead of ureq's
//! 10 MiB default, so large payloads reach the decoder.

use async_trait::async_trait;

use crate::config::TransportConfig;
use crate::error::TransportFault;
use crate::http::{RawResponse, RequestSpec, Transport};

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
    max_body: u64,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
            max_body: config.max_body,
        }
    }

    fn send_blocking(&self, request: RequestSpec) -> Result<RawResponse, TransportFault> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        if request.header("User-Agent").is_none() {
            builder = builder.header("User-Agent", self.user_agent.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let sent = match request.body {
            Some(body) => builder.body(body).map(|r| self.agent.run(r)),
            None => builder.body(()).map(|r| self.agent.run(r)),
        };
        let mut response = sent
            .map_err(|e| TransportFault::Other(e.to_string()))?
            .map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = if (200..=299).contains(&status) {
            response
                .body_mut()
                .with_config()
                .limit(self.max_body)
                .read_to_vec()
                .map_err(map_ureq_error)?
        } else {
            Vec::new()
        };

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportFault {
    match err {
        ureq::Error::Timeout(_) => TransportFault::Timeout,
        ureq::Error::Io(e) => TransportFault::Connection(e.to_string()),
        other => TransportFault::Other(other.to_string()),
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, TransportFault> {
        let transport = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || transport.send_blocking(request))
            .await
            .map_err(|e| TransportFault::Other(e.to_string()))?
    }
}
