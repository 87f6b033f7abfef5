//! Executes built requests and delivers typed results.
//!
//! # Design
//! `run_async` is the only place a transport outcome is classified and a
//! body decoded. `run` is the callback flavour: it spawns one task on the
//! runner's runtime that awaits `run_async` and hands the outcome to the
//! completion. Because the work always happens on a spawned task, the
//! completion can never fire before `run` returns, even when the transport
//! resolves immediately.
//!
//! The completion travels inside a `Delivery` guard. If the task is dropped
//! before it finishes (runtime shut down, task aborted, transport panicked),
//! the guard hands the completion a `TransportError` on a fresh thread, so
//! every run still ends in exactly one delivery.
//!
//! The runner holds no per-call state, so clones can be used from many
//! tasks at once.

use std::sync::Arc;
use std::thread;

use serde::de::DeserializeOwned;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;

use crate::error::{classify, ApiError, DecodeFault, TransportFault};
use crate::http::{RequestSpec, Transport};

/// Terminal outcome of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<M> {
    Success { model: M, request: RequestSpec },
    Failure(ApiError),
}

impl<M> ApiResult<M> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    /// The request that was sent, present only on success.
    pub fn request(&self) -> Option<&RequestSpec> {
        match self {
            ApiResult::Success { request, .. } => Some(request),
            ApiResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<(M, RequestSpec), ApiError> {
        match self {
            ApiResult::Success { model, request } => Ok((model, request)),
            ApiResult::Failure(err) => Err(err),
        }
    }
}

impl<M> From<Result<(M, RequestSpec), ApiError>> for ApiResult<M> {
    fn from(result: Result<(M, RequestSpec), ApiError>) -> Self {
        match result {
            Ok((model, request)) => ApiResult::Success { model, request },
            Err(err) => ApiResult::Failure(err),
        }
    }
}

/// Decode a 2xx body into `M`.
pub fn decode<M: DeserializeOwned>(body: &[u8]) -> Result<M, DecodeFault> {
    serde_json::from_slice(body).map_err(DecodeFault::from)
}

/// Sends requests through a `Transport` and classifies the outcome.
#[derive(Clone)]
pub struct ApiRunner {
    transport: Arc<dyn Transport>,
    handle: Handle,
}

impl ApiRunner {
    /// Runner whose callback-style runs spawn onto `handle`.
    pub fn new(transport: Arc<dyn Transport>, handle: Handle) -> Self {
        Self { transport, handle }
    }

    /// Runner bound to the runtime the caller is currently inside.
    ///
    /// Fails when called outside a tokio runtime.
    pub fn current(transport: Arc<dyn Transport>) -> Result<Self, TryCurrentError> {
        Ok(Self::new(transport, Handle::try_current()?))
    }

    /// Send `request` and decode a 2xx body into `M`.
    ///
    /// Returns the decoded model together with the request that was sent.
    pub async fn run_async<M: DeserializeOwned>(
        &self,
        request: RequestSpec,
    ) -> Result<(M, RequestSpec), ApiError> {
        tracing::debug!(
            target: "restkit_core::runner",
            method = %request.method,
            url = %request.url,
            "sending request"
        );

        let outcome = self.transport.send(&request).await;
        let result = classify(outcome).and_then(|body| decode::<M>(&body).map_err(ApiError::from));

        match result {
            Ok(model) => {
                tracing::debug!(target: "restkit_core::runner", url = %request.url, "request succeeded");
                Ok((model, request))
            }
            Err(err) => {
                tracing::warn!(
                    target: "restkit_core::runner",
                    kind = ?err.kind(),
                    status = ?err.status(),
                    url = %request.url,
                    "request failed: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Send `request` and invoke `completion` exactly once with the outcome.
    ///
    /// `completion` always runs on a spawned task after this returns. The
    /// returned handle may be awaited or dropped. If the runtime is gone
    /// or the task is aborted, `completion` receives a `TransportError`.
    pub fn run<M, F>(&self, request: RequestSpec, completion: F) -> JoinHandle<()>
    where
        M: DeserializeOwned + Send + 'static,
        F: FnOnce(ApiResult<M>) + Send + 'static,
    {
        let runner = self.clone();
        let delivery = Delivery::new(completion);
        self.handle.spawn(async move {
            let result = runner.run_async::<M>(request).await;
            delivery.deliver(ApiResult::from(result));
        })
    }
}

/// Holds a completion until it has been invoked exactly once.
struct Delivery<M, F>
where
    M: Send + 'static,
    F: FnOnce(ApiResult<M>) + Send + 'static,
{
    completion: Option<F>,
    _model: std::marker::PhantomData<fn(M)>,
}

impl<M, F> Delivery<M, F>
where
    M: Send + 'static,
    F: FnOnce(ApiResult<M>) + Send + 'static,
{
    fn new(completion: F) -> Self {
        Self {
            completion: Some(completion),
            _model: std::marker::PhantomData,
        }
    }

    fn deliver(mut self, result: ApiResult<M>) {
        if let Some(completion) = self.completion.take() {
            completion(result);
        }
    }
}

impl<M, F> Drop for Delivery<M, F>
where
    M: Send + 'static,
    F: FnOnce(ApiResult<M>) + Send + 'static,
{
    fn drop(&mut self) {
        let Some(completion) = self.completion.take() else {
            return;
        };
        tracing::warn!(target: "restkit_core::runner", "request task dropped before completion");
        let failure = ApiError::TransportError(TransportFault::Other(
            "request task dropped before completion".to_string(),
        ));
        let spawned = thread::Builder::new()
            .name("restkit-delivery".to_string())
            .spawn(move || completion(ApiResult::Failure(failure)));
        if let Err(e) = spawned {
            tracing::error!(target: "restkit_core::runner", "failed to deliver dropped run: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::error::ApiErrorKind;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Genre {
        id: u32,
        name: String,
    }

    #[test]
    fn decode_reports_fault() {
        let fault = decode::<Genre>(br#"{"id":"x"}"#).unwrap_err();
        assert!(!fault.message.is_empty());
        let genre: Genre = decode(br#"{"id":28,"name":"Action"}"#).unwrap();
        assert_eq!(genre.name, "Action");
    }

    #[test]
    fn dropped_delivery_reports_transport_error_once() {
        let (tx, rx) = std::sync::mpsc::channel();
        let delivery = Delivery::<u8, _>::new(move |result: ApiResult<u8>| {
            tx.send(result).unwrap();
        });
        drop(delivery);

        let result = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(result.error().map(ApiError::kind), Some(ApiErrorKind::Transport));
        assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
    }

    #[test]
    fn delivered_completion_is_not_called_again_on_drop() {
        let (tx, rx) = std::sync::mpsc::channel();
        let delivery = Delivery::new(move |result: ApiResult<u8>| {
            tx.send(result.is_success()).unwrap();
        });
        delivery.deliver(ApiResult::Failure(ApiError::StatusCodeError(500)));

        assert_eq!(rx.recv().unwrap(), false);
        assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
    }

    #[test]
    fn current_outside_runtime_is_an_error() {
        struct Never;

        #[async_trait::async_trait]
        impl Transport for Never {
            async fn send(
                &self,
                _request: &RequestSpec,
            ) -> Result<crate::http::RawResponse, TransportFault> {
                Err(TransportFault::Timeout)
            }
        }

        assert!(ApiRunner::current(Arc::new(Never)).is_err());
    }

    #[test]
    fn api_result_conversions() {
        let req = RequestSpec::new(
            crate::http::HttpMethod::Get,
            url::Url::parse("http://localhost/").unwrap(),
        );
        let ok: ApiResult<u8> = Ok((1, req.clone())).into();
        assert!(ok.is_success());
        assert_eq!(ok.request(), Some(&req));
        assert_eq!(ok.into_result().unwrap().0, 1);

        let failed: ApiResult<u8> = Err(ApiError::StatusCodeError(404)).into();
        assert!(!failed.is_success());
        assert!(failed.request().is_none());
        assert_eq!(failed.error().map(ApiError::kind), Some(ApiErrorKind::StatusCode));
    }
}
