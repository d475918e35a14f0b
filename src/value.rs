use crate::types::FilePart;
use crate::{RequestError, Result};
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, Serializer};
use serde_json::Number;
use std::fmt::{self, Formatter};
use std::ops::{Deref, DerefMut};

/// A variable value.
///
/// This is the tree that `variables` are parsed into. It mirrors JSON, except that a leaf can
/// also hold an uploaded file once the multipart upload map has been applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// A list of values.
    List(Vec<Value>),
    /// An object, in the order its fields were written.
    Object(IndexMap<String, Value>),
    /// An uploaded file. Never produced by parsing JSON.
    Upload(FilePart),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// A short name of this value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Upload(_) => "upload",
        }
    }

    /// Returns true if the value is `null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<FilePart> for Value {
    fn from(file: FilePart) -> Self {
        Value::Upload(file)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::List(items) => serializer.collect_seq(items),
            Value::Object(fields) => serializer.collect_map(fields),
            Value::Upload(_) => Err(ser::Error::custom("Upload is not an output type")),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut Formatter) -> fmt::Result {
                f.write_str("any JSON value")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::Boolean(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::Number(v.into()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::Number(v.into()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Number::from_f64(v)
                    .map(Value::Number)
                    .ok_or_else(|| E::custom("NaN and infinite numbers are not valid values"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::String(v))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> Result<Self::Value, D::Error> {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut fields = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    fields.insert(name, value);
                }
                Ok(Value::Object(fields))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Variables of a query.
///
/// A missing or `null` variables document is the empty mapping.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Variables(IndexMap<String, Value>);

impl Variables {
    /// Parse variables from a raw JSON string, such as the `variables` query parameter.
    ///
    /// The string must hold a JSON object or `null`.
    pub fn parse_from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| RequestError::malformed_json("variables", err))
    }

    /// Get the variables as an object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Create variables from an object value, returns `None` for any other value.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Variables(fields)),
            _ => None,
        }
    }
}

impl From<IndexMap<String, Value>> for Variables {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Variables(fields)
    }
}

impl Deref for Variables {
    type Target = IndexMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Variables {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Variables(
            <Option<IndexMap<String, Value>>>::deserialize(deserializer)?.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    #[test]
    fn test_deserialize_keeps_field_order() {
        let value: Value = serde_json::from_str(r#"{"b": 1, "a": [true, null, "x"], "c": 1.5}"#)
            .unwrap();
        match value {
            Value::Object(fields) => {
                assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
                assert_eq!(
                    fields["a"],
                    Value::List(vec![
                        Value::Boolean(true),
                        Value::Null,
                        Value::String("x".to_string())
                    ])
                );
            }
            other => panic!("expected an object, got {}", other.kind()),
        }
    }

    #[test]
    fn test_variables_from_json() {
        let variables = Variables::parse_from_json(r#"{"a": 10, "b": null}"#).unwrap();
        assert_eq!(variables.into_value(), value!({"a": 10, "b": null}));
        assert!(Variables::parse_from_json("null").unwrap().is_empty());
        assert!(matches!(
            Variables::parse_from_json("[1, 2]"),
            Err(RequestError::MalformedJson { part: "variables", .. })
        ));
        assert!(matches!(
            Variables::parse_from_json("{"),
            Err(RequestError::MalformedJson { .. })
        ));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(
            serde_json::to_string(&value!({"a": [1, "b", null]})).unwrap(),
            r#"{"a":[1,"b",null]}"#
        );

        let file = FilePart::new(crate::types::UploadValue {
            filename: "a.txt".to_string(),
            content_type: None,
            content: tempfile::tempfile().unwrap(),
        });
        assert!(serde_json::to_string(&Value::List(vec![Value::Upload(file)])).is_err());
    }

    #[test]
    fn test_serialize_variables() {
        let variables = Variables::parse_from_json(r#"{"b": [1, null], "a": "x"}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&variables).unwrap(),
            r#"{"b":[1,null],"a":"x"}"#
        );
        assert_eq!(
            serde_json::to_string(&crate::Request::new("{ a }").variables(variables)).unwrap(),
            r#"{"query":"{ a }","operationName":null,"variables":{"b":[1,null],"a":"x"}}"#
        );
    }

    #[test]
    fn test_value_macro_keeps_field_order() {
        match value!({"b": 1, "a": 2, "c": {"z": null, "y": null}}) {
            Value::Object(fields) => {
                assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
                match &fields["c"] {
                    Value::Object(inner) => {
                        assert_eq!(inner.keys().collect::<Vec<_>>(), vec!["z", "y"])
                    }
                    other => panic!("expected an object, got {}", other.kind()),
                }
            }
            other => panic!("expected an object, got {}", other.kind()),
        }
    }
}
