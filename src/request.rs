use crate::types::FilePart;
use crate::{RequestError, Result, Value, Variables};
use serde::{Deserialize, Serialize};

/// GraphQL request.
///
/// This can be deserialized from a structure of the query string, the query name and the
/// variables. The names are all in `camelCase` (e.g. `operationName`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The query source of the request.
    #[serde(default)]
    pub query: Option<String>,

    /// The operation name of the request.
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,

    /// The variables of the request.
    #[serde(default)]
    pub variables: Variables,
}

impl Request {
    /// Create a request object with query source.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Specify the operation name of the request.
    pub fn operation_name<T: Into<String>>(self, name: T) -> Self {
        Self {
            operation_name: Some(name.into()),
            ..self
        }
    }

    /// Specify the variables.
    pub fn variables(self, variables: Variables) -> Self {
        Self { variables, ..self }
    }

    /// Put an uploaded file at a variable path such as `variables.files.0`.
    ///
    /// The path must address an existing `null` placeholder; a slot that already holds an
    /// upload is overwritten. Nothing is created along the way.
    pub fn set_upload(&mut self, path: &str, file: FilePart) -> Result<()> {
        let mut segments = path.split('.');
        if segments.next() != Some("variables") {
            return Err(RequestError::unresolved(
                path,
                "the path must start with `variables`",
            ));
        }

        let name = segments
            .next()
            .ok_or_else(|| RequestError::unresolved(path, "the path names no variable"))?;
        let mut current = self
            .variables
            .get_mut(name)
            .ok_or_else(|| RequestError::unresolved(path, format!("unknown variable `{}`", name)))?;

        for segment in segments {
            current = match current {
                Value::List(items) => {
                    let len = items.len();
                    let idx = segment.parse::<usize>().map_err(|_| {
                        RequestError::unresolved(
                            path,
                            format!("`{}` is not a valid list index", segment),
                        )
                    })?;
                    items.get_mut(idx).ok_or_else(|| {
                        RequestError::unresolved(
                            path,
                            format!("index {} is out of range for a list of {}", idx, len),
                        )
                    })?
                }
                Value::Object(fields) => fields.get_mut(segment).ok_or_else(|| {
                    RequestError::unresolved(path, format!("unknown field `{}`", segment))
                })?,
                other => {
                    return Err(RequestError::unresolved(
                        path,
                        format!("cannot select `{}` in a {}", segment, other.kind()),
                    ))
                }
            };
        }

        if !matches!(current, Value::Null | Value::Upload(_)) {
            return Err(RequestError::unresolved(
                path,
                format!("expected a null placeholder, found a {}", current.kind()),
            ));
        }
        *current = Value::Upload(file);
        Ok(())
    }
}

impl<T: Into<String>> From<T> for Request {
    fn from(query: T) -> Self {
        Self::new(query)
    }
}

/// The part of a request carried by one transport source, such as the JSON body or the query
/// string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRequest {
    /// The query source, if this source has one.
    pub query: Option<String>,
    /// The operation name, if this source has one.
    pub operation_name: Option<String>,
    /// The variables, if this source has them.
    pub variables: Option<Variables>,
}

impl PartialRequest {
    /// Set the variables from a raw JSON string.
    pub fn with_variables_json(self, input: &str) -> Result<Self> {
        Ok(Self {
            variables: Some(Variables::parse_from_json(input)?),
            ..self
        })
    }
}

impl From<Request> for PartialRequest {
    fn from(request: Request) -> Self {
        Self {
            query: request.query,
            operation_name: request.operation_name,
            variables: Some(request.variables),
        }
    }
}

/// Merge request sources, highest precedence first.
///
/// Each field is taken from the first source that supplies a non-empty value. Empty strings and
/// empty variables count as absent.
pub fn resolve<I>(sources: I) -> Request
where
    I: IntoIterator<Item = PartialRequest>,
{
    let mut request = Request::default();
    let mut variables = None;

    for source in sources {
        if request.query.is_none() {
            request.query = source.query.filter(|query| !query.is_empty());
        }
        if request.operation_name.is_none() {
            request.operation_name = source.operation_name.filter(|name| !name.is_empty());
        }
        if variables.is_none() {
            variables = source.variables.filter(|variables| !variables.is_empty());
        }
    }

    request.variables = variables.unwrap_or_default();
    request
}
