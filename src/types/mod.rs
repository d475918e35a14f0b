//! Upload scalar and argument coercion.

mod argument;
mod upload;

pub use argument::{coerce_argument, ArgumentKind, UploadArgument};
pub use upload::{FilePart, UploadScalar, UploadValue};
