use ::http::{Method, StatusCode};
use std::borrow::Cow;
use thiserror::Error;

/// An alias for `Result<T, RequestError>`.
pub type Result<T, E = RequestError> = std::result::Result<T, E>;

/// An error raised while turning an HTTP request into a GraphQL [`Request`](crate::Request).
///
/// Every variant is scoped to the request being processed and is reported before the request
/// reaches an executor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    /// A JSON document (`operations`, `map` or `variables`) could not be parsed.
    #[error("Malformed JSON in `{part}`: {source}")]
    MalformedJson {
        /// The request part that held the JSON.
        part: &'static str,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A path in the upload map does not address an existing placeholder.
    #[error("Cannot bind upload to `{path}`: {reason}")]
    UnresolvedPath {
        /// The path from the upload map.
        path: String,
        /// Why the path could not be resolved.
        reason: String,
    },

    /// The upload map references a file that is not part of the request.
    #[error("The upload map references file `{0}` which is not present in the request")]
    UnknownFileKey(String),

    /// An upload argument was given a value of an incompatible kind.
    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        /// What the argument accepts.
        expected: Cow<'static, str>,
        /// The kind of value it got.
        found: &'static str,
    },

    /// The upload scalar was used where it is not supported.
    #[error("{0}")]
    UnsupportedUsage(&'static str),

    /// The `operations` part holds a batch of operations.
    #[error("Batched operations are not supported in multipart requests")]
    UnsupportedBatch,

    /// A required multipart part is missing.
    #[error("Missing `{0}` part")]
    MissingPart(&'static str),

    /// A GET request without a `query` parameter.
    #[error("Missing `query` parameter")]
    MissingQuery,

    /// The content type is not one of the supported GraphQL encodings.
    #[error("Unsupported content type `{0}`")]
    UnsupportedContentType(String),

    /// The HTTP method is neither `GET` nor `POST`.
    #[error("Method `{0}` is not allowed")]
    MethodNotAllowed(Method),

    /// The query string or the form body could not be decoded.
    #[error("Invalid query string: {0}")]
    InvalidQueryString(#[from] serde_urlencoded::de::Error),

    /// The multipart body could not be parsed.
    #[error("Invalid multipart data: {0}")]
    InvalidMultipart(#[source] multer::Error),

    /// An uploaded file exceeds the configured size limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// The request carries more files than allowed.
    #[error("Too many files, the limit is {0}")]
    TooManyFiles(usize),

    /// The body is not valid UTF-8.
    #[error("The request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Storing an upload failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    pub(crate) fn malformed_json(part: &'static str, source: serde_json::Error) -> Self {
        RequestError::MalformedJson { part, source }
    }

    pub(crate) fn unresolved(path: &str, reason: impl Into<String>) -> Self {
        RequestError::UnresolvedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// The HTTP status code a server should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::PayloadTooLarge | RequestError::TooManyFiles(_) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            RequestError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<multer::Error> for RequestError {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
                RequestError::PayloadTooLarge
            }
            _ => RequestError::InvalidMultipart(err),
        }
    }
}
