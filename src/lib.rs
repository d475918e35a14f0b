//! # Receiving GraphQL requests over HTTP
//!
//! A GraphQL request can reach a server in several shapes: a JSON body, a raw
//! `application/graphql` body, a form, the query string of a GET request, or a
//! `multipart/form-data` body carrying file uploads. This crate turns all of them into one
//! [`Request`] and hands it to an [`Executor`](http::Executor).
//!
//! * [`resolve`] merges `query`, `operationName` and `variables` from several sources, field by
//!   field, in precedence order.
//! * [`http::bind`] applies the upload map of the
//!   [GraphQL multipart request spec](https://github.com/jaydenseric/graphql-multipart-request-spec):
//!   each uploaded file replaces the `null` placeholder at its variable path.
//! * [`types::UploadScalar`] and [`types::coerce_argument`] define how an executor coerces the
//!   bound files into `Upload`, `[Upload]` and set arguments.
//!
//! ## Example
//!
//! ```no_run
//! use graphql_receive::http::{receive_request, MultipartOptions};
//!
//! # async fn run(request: http::Request<bytes::Bytes>) -> graphql_receive::Result<()> {
//! let request = receive_request(request, MultipartOptions::default().max_num_files(10)).await?;
//! println!("query: {:?}", request.query);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod value;

pub mod http;
pub mod types;

#[doc(hidden)]
pub use serde_json;

pub use error::{RequestError, Result};
pub use request::{resolve, PartialRequest, Request};
pub use value::{Value, Variables};

/// Construct a [`Value`] from a JSON literal.
///
/// ```
/// use graphql_receive::{value, Value};
///
/// let value = value!({ "files": [null, null] });
/// assert!(matches!(value, Value::Object(_)));
/// ```
#[macro_export]
macro_rules! value {
    ($($json:tt)+) => {
        $crate::Value::from($crate::serde_json::json!($($json)+))
    };
}
