use crate::types::{FilePart, UploadScalar};
use crate::{RequestError, Result, Value};
use indexmap::IndexSet;
use std::borrow::Cow;
use std::iter::FromIterator;

/// How an upload parameter is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// A single `Upload`.
    Scalar,
    /// An ordered list of uploads.
    List,
    /// A set of uploads, duplicates removed.
    Set,
}

impl ArgumentKind {
    /// The GraphQL type name of the parameter.
    pub fn type_name(self) -> Cow<'static, str> {
        match self {
            ArgumentKind::Scalar => Cow::Borrowed(UploadScalar::NAME),
            ArgumentKind::List | ArgumentKind::Set => {
                Cow::Owned(format!("[{}]", UploadScalar::NAME))
            }
        }
    }
}

/// A coerced upload argument.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadArgument {
    /// One file.
    Single(FilePart),
    /// Files in the order the client listed them.
    List(Vec<FilePart>),
    /// Distinct files.
    Set(IndexSet<FilePart>),
}

/// Coerce a bound variable value to an upload argument of the given kind.
///
/// `null` is `None` for every kind.
pub fn coerce_argument(kind: ArgumentKind, value: &Value) -> Result<Option<UploadArgument>> {
    let mismatch = |found: &Value| RequestError::TypeMismatch {
        expected: kind.type_name(),
        found: found.kind(),
    };

    match (kind, value) {
        (_, Value::Null) => Ok(None),
        (ArgumentKind::Scalar, Value::Upload(file)) => Ok(Some(UploadArgument::Single(file.clone()))),
        (ArgumentKind::List, Value::List(items)) => Ok(Some(UploadArgument::List(
            collect_uploads(items).map_err(mismatch)?,
        ))),
        (ArgumentKind::Set, Value::List(items)) => Ok(Some(UploadArgument::Set(
            collect_uploads(items).map_err(mismatch)?,
        ))),
        (_, other) => Err(mismatch(other)),
    }
}

fn collect_uploads<'a, C>(items: &'a [Value]) -> std::result::Result<C, &'a Value>
where
    C: FromIterator<FilePart>,
{
    items
        .iter()
        .map(|item| match item {
            Value::Upload(file) => Ok(file.clone()),
            other => Err(other),
        })
        .collect()
}
