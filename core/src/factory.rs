//! Assembles `RequestSpec` values from a domain, an endpoint and params.

use url::Url;

use crate::endpoint::{Domain, Endpoint};
use crate::error::BuildError;
use crate::http::RequestSpec;
use crate::params::ParamBuilder;

/// Builds ready-to-send requests.
///
/// Headers are layered: factory defaults first, then endpoint headers, then
/// whatever the param builder sets (the body content type). Later layers
/// replace earlier ones by case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct RequestFactory {
    default_headers: Vec<(String, String)>,
}

impl RequestFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build<D, E, P>(&self, domain: &D, endpoint: &E, params: &P) -> Result<RequestSpec, BuildError>
    where
        D: Domain + ?Sized,
        E: Endpoint + ?Sized,
        P: ParamBuilder + ?Sized,
    {
        let url = join_url(domain.base_url(), &endpoint.path())?;
        let mut request = RequestSpec::new(endpoint.method(), url);
        for (name, value) in self.default_headers.iter().chain(endpoint.headers().iter()) {
            request.set_header(name, value);
        }
        Ok(params.apply(request, endpoint.content_type()))
    }
}

/// Append `path` to the base URL's path, keeping any query or fragment
/// already on the base.
fn join_url(base: &str, path: &str) -> Result<Url, BuildError> {
    let invalid = |reason: String| BuildError::InvalidUrl {
        url: format!("{base}{path}"),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("base URL cannot carry a path".to_string()));
    }
    let path = path.trim_start_matches('/');
    if !path.is_empty() {
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
    }
    Ok(url)
}
