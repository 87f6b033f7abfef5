//! Minimal REST client pipeline.
//!
//! # Overview
//! A caller describes an operation as a `Domain` plus an `Endpoint`, supplies
//! `Params`, and lets `RequestFactory` assemble a `RequestSpec`. `ApiRunner`
//! sends it through a `Transport`, classifies the outcome, and decodes 2xx
//! bodies into the caller's model type.
//!
//! # Design
//! - Each call builds its own `RequestSpec`; nothing mutable is shared.
//! - Failures fall into one closed taxonomy (`ApiError`): transport fault,
//!   non-2xx status, or undecodable body. No retries anywhere.
//! - `ApiRunner::run_async` and the callback-style `ApiRunner::run` share
//!   one classification path.
//! - The transport is a trait; `UreqTransport` is the bundled implementation.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod factory;
pub mod http;
pub mod params;
pub mod runner;
pub mod transport;

pub use config::TransportConfig;
pub use endpoint::{ContentType, Domain, Endpoint, Headers, WebDomain};
pub use error::{ApiError, ApiErrorKind, BuildError, DecodeFault, TransportFault};
pub use factory::RequestFactory;
pub use http::{HttpMethod, RawResponse, RequestSpec, Transport};
pub use params::{ParamBuilder, ParamValue, Params};
pub use runner::{ApiResult, ApiRunner};
pub use transport::UreqTransport;
