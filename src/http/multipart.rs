use crate::types::{FilePart, UploadValue};
use crate::{Request, RequestError, Result};
use blocking::Unblock;
use bytes::Bytes;
use futures_util::io::{AsyncSeekExt, AsyncWriteExt};
use indexmap::IndexMap;
use multer::Multipart;
use serde::Deserialize;
use std::io::SeekFrom;

/// Files of a multipart request, keyed by the name of their part.
pub type FileParts = IndexMap<String, FilePart>;

/// The `map` part of a multipart request: file key to variable paths.
pub type UploadMap = IndexMap<String, Vec<String>>;

/// Options for `receive_multipart`.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MultipartOptions {
    /// The maximum size of each file.
    pub max_file_size: Option<usize>,
    /// The maximum number of files.
    pub max_num_files: Option<usize>,
}

impl MultipartOptions {
    /// Set maximum file size.
    pub fn max_file_size(self, size: usize) -> Self {
        MultipartOptions {
            max_file_size: Some(size),
            ..self
        }
    }

    /// Set maximum number of files.
    pub fn max_num_files(self, n: usize) -> Self {
        MultipartOptions {
            max_num_files: Some(n),
            ..self
        }
    }
}

/// Receive a GraphQL request from a multipart body.
///
/// Files are written to temporary files on the blocking thread pool, then the upload map is
/// applied with [`bind`].
pub async fn receive_multipart(
    body: Bytes,
    boundary: impl Into<String>,
    opts: MultipartOptions,
) -> Result<Request> {
    let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = Multipart::new(stream, boundary);

    let mut operations = None;
    let mut map = None;
    let mut files = FileParts::new();

    while let Some(mut field) = multipart.next_field().await? {
        match field.name() {
            Some("operations") => operations = Some(field.text().await?),
            Some("map") => map = Some(field.text().await?),
            _ => {
                let (name, filename) = match (field.name(), field.file_name()) {
                    (Some(name), Some(filename)) => (name.to_string(), filename.to_string()),
                    _ => continue,
                };
                if let Some(max_num_files) = opts.max_num_files {
                    if files.len() >= max_num_files {
                        return Err(RequestError::TooManyFiles(max_num_files));
                    }
                }
                let content_type = field.content_type().map(ToString::to_string);

                let mut content = Unblock::new(blocking::unblock(tempfile::tempfile).await?);
                let mut size = 0;
                while let Some(chunk) = field.chunk().await? {
                    size += chunk.len();
                    if let Some(max_file_size) = opts.max_file_size {
                        if size > max_file_size {
                            return Err(RequestError::PayloadTooLarge);
                        }
                    }
                    content.write_all(&chunk).await?;
                }
                content.flush().await?;
                content.seek(SeekFrom::Start(0)).await?;
                let content = content.into_inner().await;

                tracing::debug!(name = %name, filename = %filename, size, "received file part");
                files.insert(
                    name,
                    FilePart::new(UploadValue {
                        filename,
                        content_type,
                        content,
                    }),
                );
            }
        }
    }

    let operations = operations.ok_or(RequestError::MissingPart("operations"))?;
    let map = map.ok_or(RequestError::MissingPart("map"))?;
    bind(&operations, &map, &files)
}

/// Build a request from the `operations` and `map` parts and the received files.
///
/// Every path of the map must address a `null` placeholder in the operations' variables, and
/// every file key must name a received file. Entries are applied in the order of the map.
pub fn bind(operations: &str, map: &str, files: &FileParts) -> Result<Request> {
    if operations.trim_start().starts_with('[') {
        return Err(RequestError::UnsupportedBatch);
    }

    let mut request: Request = serde_json::from_str(operations)
        .map_err(|err| RequestError::malformed_json("operations", err))?;
    let map: UploadMap =
        serde_json::from_str(map).map_err(|err| RequestError::malformed_json("map", err))?;

    for (file_key, paths) in &map {
        let file = files
            .get(file_key)
            .ok_or_else(|| RequestError::UnknownFileKey(file_key.clone()))?;
        for path in paths {
            request.set_upload(path, file.clone())?;
            tracing::debug!(file_key = %file_key, path = %path, "bound upload");
        }
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value, Value};

    fn files(keys: &[&str]) -> FileParts {
        keys.iter()
            .map(|key| {
                let file = FilePart::new(UploadValue {
                    filename: format!("{}.txt", key),
                    content_type: None,
                    content: tempfile::tempfile().unwrap(),
                });
                (key.to_string(), file)
            })
            .collect()
    }

    #[test]
    fn test_bind_single_file() {
        let files = files(&["1"]);
        let request = bind(
            r#"{"query": "mutation ($file1: Upload) { upload(file1: $file1) }", "variables": {"file1": null, "n": 1}}"#,
            r#"{"1": ["variables.file1"]}"#,
            &files,
        )
        .unwrap();
        assert_eq!(request.variables["file1"], Value::Upload(files["1"].clone()));
        assert_eq!(request.variables["n"], value!(1));
    }

    #[test]
    fn test_bind_list() {
        let files = files(&["1", "2"]);
        let request = bind(
            r#"{"query": "mutation ($files: [Upload]) { upload(files: $files) }", "variables": {"files": [null, null]}}"#,
            r#"{"1": ["variables.files.0"], "2": ["variables.files.1"]}"#,
            &files,
        )
        .unwrap();
        assert_eq!(
            request.variables["files"],
            Value::List(vec![
                Value::Upload(files["1"].clone()),
                Value::Upload(files["2"].clone()),
            ])
        );
    }

    #[test]
    fn test_bind_same_file_twice() {
        let files = files(&["0"]);
        let request = bind(
            r#"{"query": "mutation", "variables": {"a": null, "b": {"c": null}}}"#,
            r#"{"0": ["variables.a", "variables.b.c"]}"#,
            &files,
        )
        .unwrap();
        assert_eq!(request.variables["a"], Value::Upload(files["0"].clone()));
        assert_eq!(
            request.variables["b"],
            Value::Object(
                vec![("c".to_string(), Value::Upload(files["0"].clone()))]
                    .into_iter()
                    .collect()
            )
        );
    }

    #[test]
    fn test_bind_unknown_file_key() {
        let err = bind(
            r#"{"query": "mutation", "variables": {"file1": null}}"#,
            r#"{"3": ["variables.file1"]}"#,
            &files(&["1"]),
        )
        .unwrap_err();
        assert!(matches!(err, RequestError::UnknownFileKey(key) if key == "3"));
    }

    #[test]
    fn test_bind_unresolved_path() {
        let err = bind(
            r#"{"query": "mutation", "variables": {"file1": null}}"#,
            r#"{"1": ["variables.nonexistent"]}"#,
            &files(&["1"]),
        )
        .unwrap_err();
        assert!(matches!(err, RequestError::UnresolvedPath { path, .. } if path == "variables.nonexistent"));
    }

    #[test]
    fn test_bind_malformed() {
        assert!(matches!(
            bind("{", "{}", &files(&[])),
            Err(RequestError::MalformedJson { part: "operations", .. })
        ));
        assert!(matches!(
            bind(r#"{"query": "{ a }"}"#, r#"{"0": "variables.a"}"#, &files(&["0"])),
            Err(RequestError::MalformedJson { part: "map", .. })
        ));
        assert!(matches!(
            bind(r#" [{"query": "{ a }"}]"#, "{}", &files(&[])),
            Err(RequestError::UnsupportedBatch)
        ));
    }

    #[test]
    fn test_bind_without_variables() {
        let request = bind(r#"{"query": "{ a }"}"#, "{}", &files(&[])).unwrap();
        assert_eq!(request, Request::new("{ a }"));
    }
}
