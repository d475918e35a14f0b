//! Receiving GraphQL requests over HTTP.
//!
//! | Method | Content type                        | Sources, highest precedence first |
//! |--------|-------------------------------------|-----------------------------------|
//! | GET    |                                     | query string                      |
//! | POST   | `application/json`                  | query string, JSON body           |
//! | POST   | `application/graphql`               | query string, body as the query   |
//! | POST   | `application/x-www-form-urlencoded` | form fields, query string         |
//! | POST   | `multipart/form-data`               | `operations` and `map` parts      |

mod multipart;

pub use multipart::{bind, receive_multipart, FileParts, MultipartOptions, UploadMap};

use crate::request::{resolve, PartialRequest};
use crate::{Request, RequestError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use ::http::header::CONTENT_TYPE;
use ::http::Method;
use serde::Deserialize;

/// Executes normalized requests.
///
/// This is the seam to the GraphQL engine: schema, validation and resolvers live behind it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The execution result.
    type Response: Send;

    /// Execute a request.
    async fn execute(&self, request: Request) -> Self::Response;
}

/// `query`, `operationName` and `variables` as they appear in a query string or a form body.
#[derive(Debug, Default, Deserialize)]
struct HttpParams {
    query: Option<String>,
    #[serde(rename = "operationName")]
    operation_name: Option<String>,
    variables: Option<String>,
}

impl HttpParams {
    fn parse(input: &[u8]) -> Result<Self> {
        Ok(serde_urlencoded::from_bytes(input)?)
    }

    fn into_partial(self) -> Result<PartialRequest> {
        let partial = PartialRequest {
            query: self.query,
            operation_name: self.operation_name,
            variables: None,
        };
        match self.variables.as_deref() {
            Some(variables) if !variables.is_empty() => partial.with_variables_json(variables),
            _ => Ok(partial),
        }
    }
}

/// Parse a request from the query string of a GET request.
///
/// `query` is required, `variables` is a JSON string.
pub fn parse_query_string(input: &str) -> Result<Request> {
    let params = HttpParams::parse(input.as_bytes())?;
    if params.query.as_deref().map_or(true, str::is_empty) {
        return Err(RequestError::MissingQuery);
    }
    Ok(resolve(vec![params.into_partial()?]))
}

/// Receive a request with an `application/json` body.
///
/// Parameters in the query string override the body, field by field.
pub fn receive_json(body: &[u8], query_string: Option<&str>) -> Result<Request> {
    let body: Request =
        serde_json::from_slice(body).map_err(|err| RequestError::malformed_json("body", err))?;
    let params = HttpParams::parse(query_string.unwrap_or_default().as_bytes())?;
    Ok(resolve(vec![params.into_partial()?, body.into()]))
}

/// Receive a request with an `application/graphql` body, which is the query source.
///
/// A `query` parameter in the query string overrides the body.
pub fn receive_graphql(body: &[u8], query_string: Option<&str>) -> Result<Request> {
    let query = std::str::from_utf8(body)?;
    let params = HttpParams::parse(query_string.unwrap_or_default().as_bytes())?;
    Ok(resolve(vec![
        params.into_partial()?,
        PartialRequest {
            query: Some(query.to_string()),
            ..PartialRequest::default()
        },
    ]))
}

/// Receive a request with an `application/x-www-form-urlencoded` body.
///
/// Form fields override parameters in the query string.
pub fn receive_form(body: &[u8], query_string: Option<&str>) -> Result<Request> {
    let form = HttpParams::parse(body)?;
    let params = HttpParams::parse(query_string.unwrap_or_default().as_bytes())?;
    Ok(resolve(vec![form.into_partial()?, params.into_partial()?]))
}

/// Receive a GraphQL request from an HTTP request.
///
/// A missing content type is treated as `application/json`.
pub async fn receive_request(
    request: ::http::Request<Bytes>,
    opts: MultipartOptions,
) -> Result<Request> {
    let (parts, body) = request.into_parts();
    let query_string = parts.uri.query();

    if parts.method == Method::GET {
        return parse_query_string(query_string.unwrap_or_default());
    }
    if parts.method != Method::POST {
        return Err(RequestError::MethodNotAllowed(parts.method));
    }

    let content_type = match parts.headers.get(CONTENT_TYPE) {
        Some(value) => value.to_str().map_err(|_| {
            RequestError::UnsupportedContentType(String::from_utf8_lossy(value.as_bytes()).into())
        })?,
        None => "application/json",
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    tracing::debug!(content_type = %essence, "receiving GraphQL request");

    match essence.as_str() {
        "application/json" => receive_json(&body, query_string),
        "application/graphql" => receive_graphql(&body, query_string),
        "application/x-www-form-urlencoded" => receive_form(&body, query_string),
        "multipart/form-data" => {
            let boundary = multer::parse_boundary(content_type)?;
            receive_multipart(body, boundary, opts).await
        }
        _ => Err(RequestError::UnsupportedContentType(content_type.to_string())),
    }
}

/// Receive a GraphQL request and execute it.
///
/// The executor is only called when the request was received without error.
pub async fn execute_http<E: Executor>(
    executor: &E,
    request: ::http::Request<Bytes>,
    opts: MultipartOptions,
) -> Result<E::Response> {
    match receive_request(request, opts).await {
        Ok(request) => {
            tracing::debug!(
                operation_name = ?request.operation_name,
                variables = request.variables.len(),
                "executing GraphQL request"
            );
            Ok(executor.execute(request).await)
        }
        Err(err) => {
            tracing::warn!(error = %err, status = %err.status_code(), "rejected GraphQL request");
            Err(err)
        }
    }
}
