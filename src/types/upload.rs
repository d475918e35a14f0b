use crate::{RequestError, Result, Value};
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Seek, SeekFrom};
use std::sync::Arc;

/// A file received in a multipart request.
#[derive(Debug)]
pub struct UploadValue {
    /// The file name sent by the client.
    pub filename: String,
    /// The content type of the file.
    pub content_type: Option<String>,
    /// The file contents, stored in a temporary file.
    pub content: File,
}

impl UploadValue {
    /// Attempt to clone the upload value.
    pub fn try_clone(&self) -> std::io::Result<Self> {
        Ok(Self {
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            content: self.content.try_clone()?,
        })
    }
}

/// Uploaded file.
///
/// **Reference:** <https://github.com/jaydenseric/graphql-multipart-request-spec>
///
/// A handle to a file part of a `multipart/form-data` request. After the upload map has been
/// applied, the variables of the request hold `FilePart`s wherever the client put a `null`
/// placeholder. Cloning a handle shares the file, it never copies its contents, so the same
/// file can sit in several variable slots.
///
/// Two handles are equal only if they refer to the same uploaded part.
///
/// # Example Curl Request
///
/// ```curl
/// curl 'localhost:8000' \
/// --form 'operations={
///         "query": "mutation ($file: Upload!) { upload(file: $file)  }",
///         "variables": { "file": null }}' \
/// --form 'map={ "0": ["variables.file"] }' \
/// --form '0=@myFile.txt'
/// ```
#[derive(Debug, Clone)]
pub struct FilePart(Arc<UploadValue>);

impl FilePart {
    /// Create a handle owning the upload.
    pub fn new(upload: UploadValue) -> Self {
        FilePart(Arc::new(upload))
    }

    /// The file name sent by the client.
    pub fn filename(&self) -> &str {
        &self.0.filename
    }

    /// The content type of the file.
    pub fn content_type(&self) -> Option<&str> {
        self.0.content_type.as_deref()
    }

    /// Borrow the upload value.
    pub fn value(&self) -> &UploadValue {
        &self.0
    }

    /// Open an independent reader positioned at the start of the file.
    pub fn reader(&self) -> std::io::Result<File> {
        let mut file = self.0.content.try_clone()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    }
}

impl PartialEq for FilePart {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FilePart {}

impl Hash for FilePart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// The `Upload` scalar.
///
/// Uploads are write-only inputs: the only accepted value is a file the transport already
/// received, and the scalar can never appear in a response.
pub struct UploadScalar;

impl UploadScalar {
    /// The GraphQL name of the scalar.
    pub const NAME: &'static str = "Upload";

    /// The description registered with the scalar.
    pub const DESCRIPTION: &'static str =
        "A file uploaded with a GraphQL multipart request (https://github.com/jaydenseric/graphql-multipart-request-spec)";

    /// Coerce a variable value.
    pub fn parse_value(value: &Value) -> Result<FilePart> {
        match value {
            Value::Upload(file) => Ok(file.clone()),
            other => Err(RequestError::TypeMismatch {
                expected: Self::NAME.into(),
                found: other.kind(),
            }),
        }
    }

    /// Coerce a literal written in the query document. Always fails.
    pub fn parse_literal(_value: &Value) -> Result<FilePart> {
        Err(RequestError::UnsupportedUsage(
            "Parsing the literal of an upload is not supported",
        ))
    }

    /// Coerce a resolved value for output. Always fails.
    pub fn serialize(_file: &FilePart) -> Result<Value> {
        Err(RequestError::UnsupportedUsage("Upload is not an output type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::{Read, Write};

    fn upload(name: &str, content: &str) -> FilePart {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        FilePart::new(UploadValue {
            filename: name.to_string(),
            content_type: Some("text/plain".to_string()),
            content: file,
        })
    }

    #[test]
    fn test_identity() {
        let a = upload("a.txt", "a");
        let b = upload("a.txt", "a");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let set: HashSet<_> = vec![a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_reader() {
        let file = upload("a.txt", "hello");
        for _ in 0..2 {
            let mut content = String::new();
            file.reader().unwrap().read_to_string(&mut content).unwrap();
            assert_eq!(content, "hello");
        }
        assert_eq!(file.filename(), "a.txt");
        assert_eq!(file.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_coercion() {
        let file = upload("a.txt", "a");
        assert_eq!(
            UploadScalar::parse_value(&Value::Upload(file.clone())).unwrap(),
            file
        );
        assert!(matches!(
            UploadScalar::parse_value(&Value::String("a.txt".to_string())),
            Err(RequestError::TypeMismatch { found: "string", .. })
        ));
        assert!(matches!(
            UploadScalar::parse_literal(&Value::Null),
            Err(RequestError::UnsupportedUsage(_))
        ));
        assert!(matches!(
            UploadScalar::serialize(&file),
            Err(RequestError::UnsupportedUsage(_))
        ));
    }
}
