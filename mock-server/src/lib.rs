use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, Request},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Well-formed genre list served by the stub routes.
pub const GENRE_JSON: &str = include_str!("../fixtures/genre.json");

/// Truncated genre list with a mistyped id.
pub const GENRE_CORRUPT_JSON: &str = include_str!("../fixtures/genre_corrupt.json");

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}

/// What `/echo` saw, reflected back as JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/genre/movie/list", get(genre_list))
        .route("/status/{code}", get(with_status))
        .route("/corrupt", get(corrupt))
        .route("/slow/{millis}", get(slow))
        .route("/large/{bytes}", get(large))
        .route("/echo", any(echo))
        .layer(middleware::from_fn(log_stub))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn log_stub(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    tracing::info!(%method, %uri, status = response.status().as_u16(), "stubbed request");
    response
}

fn json_body(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn genre_list() -> Response {
    json_body(StatusCode::OK, GENRE_JSON)
}

async fn with_status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => json_body(status, GENRE_JSON),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn corrupt() -> Response {
    json_body(StatusCode::OK, GENRE_CORRUPT_JSON)
}

async fn slow(Path(millis): Path<u64>) -> Response {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    json_body(StatusCode::OK, GENRE_JSON)
}

/// A JSON string literal whose payload is `bytes` long.
pub fn large_json_string(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 2);
    body.push('"');
    body.extend(std::iter::repeat('a').take(bytes));
    body.push('"');
    body
}

async fn large(Path(bytes): Path<usize>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        large_json_string(bytes),
    )
        .into_response()
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(Echo {
        method: method.to_string(),
        query,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
