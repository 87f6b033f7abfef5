//! Request parameters and how they attach to a request.
//!
//! # Design
//! `Params` is a bag of uniquely keyed `ParamValue`s built fresh per call.
//! Where the entries end up depends on the request:
//!
//! - GET, DELETE, HEAD, OPTIONS: appended to the URL query string. Values
//!   without a string form (null, maps, non-finite floats, nested arrays)
//!   are skipped.
//! - POST, PUT, PATCH with `ContentType::Json`: a JSON object body.
//! - POST, PUT, PATCH with `ContentType::FormUrlEncoded`: a percent-encoded
//!   `key=value&...` body, using the same skipping rules as the query. When
//!   every entry is skipped no body or content type is set.
//!
//! Keys iterate in sorted order so the produced request is deterministic.
//! An empty `Params` leaves the request untouched.

use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

use crate::endpoint::ContentType;
use crate::http::RequestSpec;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    fn is_scalar(&self) -> bool {
        matches!(
            self,
            ParamValue::Bool(_) | ParamValue::Int(_) | ParamValue::Float(_) | ParamValue::String(_)
        )
    }

    /// String form used in query strings and form bodies.
    ///
    /// Arrays of scalars join with `,`. Returns `None` for values that have
    /// no meaningful string form.
    pub fn to_query_string(&self) -> Option<String> {
        match self {
            ParamValue::Null | ParamValue::Map(_) => None,
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Int(i) => Some(i.to_string()),
            ParamValue::Float(f) if f.is_finite() => Some(f.to_string()),
            ParamValue::Float(_) => None,
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Array(items) => {
                if items.is_empty() || !items.iter().all(ParamValue::is_scalar) {
                    return None;
                }
                let parts: Option<Vec<String>> =
                    items.iter().map(ParamValue::to_query_string).collect();
                parts.map(|p| p.join(","))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

macro_rules! int_param {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                ParamValue::Int(i64::from(v))
            }
        })*
    };
}

int_param!(i8, i16, i32, i64, u8, u16, u32);

/// Wide integers past `i64::MAX` keep their exact digits as a string.
macro_rules! wide_int_param {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                i64::try_from(v).map_or_else(|_| ParamValue::String(v.to_string()), ParamValue::Int)
            }
        })*
    };
}

wide_int_param!(u64, usize, isize, i128, u128);

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(f64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::Null, Into::into)
    }
}

impl From<BTreeMap<String, ParamValue>> for ParamValue {
    fn from(v: BTreeMap<String, ParamValue>) -> Self {
        ParamValue::Map(v)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => n.as_f64().map_or(ParamValue::Null, ParamValue::Float),
            },
            Value::String(s) => ParamValue::String(s),
            Value::Array(items) => ParamValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => ParamValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Applies parameters onto an in-progress request.
pub trait ParamBuilder {
    fn apply(&self, request: RequestSpec, content_type: ContentType) -> RequestSpec;
}

/// Caller-supplied key/value request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated key replaces the earlier value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that have a string form, in key order.
    pub fn string_pairs(&self) -> Vec<(&str, String)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.to_query_string().map(|s| (k.as_str(), s)))
            .collect()
    }

    fn apply_query(&self, mut request: RequestSpec) -> RequestSpec {
        let pairs = self.string_pairs();
        if pairs.is_empty() {
            return request;
        }
        request.url.query_pairs_mut().extend_pairs(pairs);
        request
    }

    fn apply_json(&self, mut request: RequestSpec) -> RequestSpec {
        match serde_json::to_vec(&self.entries) {
            Ok(body) => {
                request.set_header("Content-Type", ContentType::Json.mime());
                request.body = Some(body);
            }
            Err(e) => {
                tracing::error!(target: "restkit_core::params", "Failed to serialize JSON body: {}", e);
            }
        }
        request
    }

    fn apply_form(&self, mut request: RequestSpec) -> RequestSpec {
        let pairs = self.string_pairs();
        if pairs.is_empty() {
            return request;
        }
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        request.set_header("Content-Type", ContentType::FormUrlEncoded.mime());
        request.body = Some(body.into_bytes());
        request
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl ParamBuilder for Params {
    fn apply(&self, request: RequestSpec, content_type: ContentType) -> RequestSpec {
        if self.is_empty() {
            return request;
        }
        if !request.method.has_body() {
            return self.apply_query(request);
        }
        match content_type {
            ContentType::Json => self.apply_json(request),
            ContentType::FormUrlEncoded => self.apply_form(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::http::HttpMethod;

    fn request(method: HttpMethod) -> RequestSpec {
        RequestSpec::new(method, Url::parse("http://localhost:3000/search").unwrap())
    }

    #[test]
    fn get_serializes_into_query_sorted_by_key() {
        let params = Params::new()
            .with("query", "star wars")
            .with("page", 2)
            .with("adult", false);
        let req = params.apply(request(HttpMethod::Get), ContentType::Json);
        assert_eq!(
            req.url.as_str(),
            "http://localhost:3000/search?adult=false&page=2&query=star+wars"
        );
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn get_skips_values_without_string_form() {
        let params = Params::new()
            .with("keep", "yes")
            .with("none", ParamValue::Null)
            .with("nan", f64::NAN)
            .with("nested", ParamValue::Map(BTreeMap::new()))
            .with("deep", ParamValue::Array(vec![ParamValue::Array(vec![])]));
        let req = params.apply(request(HttpMethod::Get), ContentType::Json);
        assert_eq!(req.url.query(), Some("keep=yes"));
    }

    #[test]
    fn only_unstringable_values_leave_url_untouched() {
        let params = Params::new().with("none", ParamValue::Null);
        let req = params.apply(request(HttpMethod::Delete), ContentType::Json);
        assert_eq!(req.url.as_str(), "http://localhost:3000/search");
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn scalar_arrays_join_with_commas() {
        let value = ParamValue::from(vec![1, 2, 3]);
        assert_eq!(value.to_query_string().as_deref(), Some("1,2,3"));
        assert_eq!(ParamValue::from(1.5).to_query_string().as_deref(), Some("1.5"));
        assert_eq!(ParamValue::from(None::<i32>).to_query_string(), None);
        assert_eq!(ParamValue::Array(vec![]).to_query_string(), None);
    }

    #[test]
    fn query_is_appended_to_existing_query() {
        let mut req = request(HttpMethod::Get);
        req.url.set_query(Some("api_key=abc"));
        let req = Params::new().with("language", "en-US").apply(req, ContentType::Json);
        assert_eq!(req.url.query(), Some("api_key=abc&language=en-US"));
    }

    #[test]
    fn post_json_builds_object_body() {
        let params = Params::new()
            .with("value", 8.5)
            .with("tags", vec!["a", "b"])
            .with("note", ParamValue::Null);
        let req = params.apply(request(HttpMethod::Post), ContentType::Json);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["value"], 8.5);
        assert_eq!(body["tags"], serde_json::json!(["a", "b"]));
        assert!(body["note"].is_null());
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn put_form_builds_encoded_body() {
        let params = Params::new().with("name", "a&b c").with("id", 7);
        let req = params.apply(request(HttpMethod::Put), ContentType::FormUrlEncoded);
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(req.body_str(), Some("id=7&name=a%26b+c"));
    }

    #[test]
    fn form_with_only_skipped_values_leaves_request_unchanged() {
        let params = Params::new()
            .with("none", ParamValue::Null)
            .with("nested", ParamValue::Map(BTreeMap::new()));
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch] {
            let original = request(method);
            let req = params.apply(original.clone(), ContentType::FormUrlEncoded);
            assert_eq!(req, original);
            assert!(req.header("content-type").is_none());
        }
    }

    #[test]
    fn head_and_options_use_query() {
        for method in [HttpMethod::Head, HttpMethod::Options] {
            let req = Params::new()
                .with("page", 1)
                .apply(request(method), ContentType::FormUrlEncoded);
            assert_eq!(req.url.query(), Some("page=1"));
            assert!(req.body.is_none());
        }
    }

    #[test]
    fn wide_integers_convert() {
        assert_eq!(ParamValue::from(42u64), ParamValue::Int(42));
        assert_eq!(ParamValue::from(7usize), ParamValue::Int(7));
        assert_eq!(ParamValue::from(-3isize), ParamValue::Int(-3));
        assert_eq!(
            ParamValue::from(u64::MAX),
            ParamValue::String("18446744073709551615".to_string())
        );
        assert_eq!(
            ParamValue::from(u64::MAX).to_query_string().as_deref(),
            Some("18446744073709551615")
        );
    }

    #[test]
    fn empty_params_leave_request_unchanged() {
        for method in [HttpMethod::Get, HttpMethod::Post] {
            let original = request(method);
            let req = Params::new().apply(original.clone(), ContentType::Json);
            assert_eq!(req, original);
        }
    }

    #[test]
    fn json_values_convert() {
        let value = ParamValue::from(serde_json::json!({"ids": [1, 2.5], "on": true, "x": null}));
        let ParamValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map["ids"],
            ParamValue::Array(vec![ParamValue::Int(1), ParamValue::Float(2.5)])
        );
        assert_eq!(map["on"], ParamValue::Bool(true));
        assert_eq!(map["x"], ParamValue::Null);
    }

    #[test]
    fn repeated_key_replaces_value() {
        let params: Params = [("page", 1), ("page", 3)].into_iter().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("page"), Some(&ParamValue::Int(3)));
    }
}
