//! Declarative descriptions of API operations and the hosts they live on.
//!
//! # Design
//! A `Domain` supplies the base URL; an `Endpoint` supplies everything else
//! about one operation (relative path, method, extra headers, content type).
//! Both are plain data owned by the caller. Endpoints are usually a fieldless
//! enum with one variant per operation, implementing `Endpoint` by matching
//! on `self`.

use crate::http::HttpMethod;

/// Extra headers an endpoint attaches to every request it describes.
pub type Headers = Vec<(String, String)>;

/// Encoding used for parameters carried in a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    FormUrlEncoded,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Base URL authority shared by every endpoint of one API.
pub trait Domain {
    fn base_url(&self) -> &str;
}

/// A domain backed by an owned base URL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDomain {
    base_url: String,
}

impl WebDomain {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Domain for WebDomain {
    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Static description of one API operation.
pub trait Endpoint {
    /// Path relative to the domain's base URL, e.g. `/genre/movie/list`.
    fn path(&self) -> String;

    fn method(&self) -> HttpMethod;

    fn headers(&self) -> Headers {
        Vec::new()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Json
    }
}
