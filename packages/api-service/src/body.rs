//! Request body encoding and response body parsing.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, MimeType};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestDataType {
    #[default]
    Json,
    FormData,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseDataType {
    #[default]
    Json,
    Text,
    Blob,
}

/// How request bodies are sent and response bodies are read.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypes {
    pub request: RequestDataType,
    pub response: ResponseDataType,
}

impl DataTypes {
    pub fn new(request: RequestDataType, response: ResponseDataType) -> Self {
        Self { request, response }
    }

    pub fn request(self, request: RequestDataType) -> Self {
        Self { request, ..self }
    }

    pub fn response(self, response: ResponseDataType) -> Self {
        Self { response, ..self }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    Json(String),
    /// Fields for a `multipart/form-data` body. A field name may repeat.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn encode<B>(data_type: RequestDataType, body: &B) -> Result<Self, Error>
    where
        B: Serialize + ?Sized,
    {
        match data_type {
            RequestDataType::Json => serde_json::to_string(body)
                .map(Self::Json)
                .map_err(Error::encode_body),
            RequestDataType::FormData => {
                let Value::Object(fields) = serde_json::to_value(body).map_err(Error::encode_body)?
                else {
                    return Err(Error::EncodeBody(
                        "form data must be built from an object".to_owned(),
                    ));
                };

                let mut form = Vec::with_capacity(fields.len());

                for (name, value) in fields {
                    match value {
                        Value::Array(elements) => form.extend(
                            elements
                                .into_iter()
                                .map(|element| (name.clone(), form_value(element))),
                        ),
                        value => form.push((name, form_value(value))),
                    }
                }

                Ok(Self::Form(form))
            }
        }
    }

    pub fn mime_type(&self) -> MimeType {
        match self {
            Self::Json(_) => MimeType::Json,
            Self::Form(_) => MimeType::FormData,
        }
    }
}

fn form_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        value => value.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Blob(Vec<u8>),
}

impl ResponseBody {
    pub fn parse(data_type: ResponseDataType, bytes: &[u8]) -> Result<Self, String> {
        match data_type {
            ResponseDataType::Json => serde_json::from_slice(bytes)
                .map(Self::Json)
                .map_err(|e| e.to_string()),
            ResponseDataType::Text => String::from_utf8(bytes.to_vec())
                .map(Self::Text)
                .map_err(|e| e.to_string()),
            ResponseDataType::Blob => Ok(Self::Blob(bytes.to_vec())),
        }
    }

    /// The `errors` reported by a JSON body, if there are any.
    pub fn errors(&self) -> Option<Vec<String>> {
        let Self::Json(Value::Object(body)) = self else { return None };
        let errors = body.get("errors")?.as_array()?;

        if errors.is_empty() {
            return None;
        }

        Some(
            errors
                .iter()
                .map(|error| match error {
                    Value::String(message) => message.clone(),
                    error => error.to_string(),
                })
                .collect(),
        )
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Blob(bytes) => bytes.into_iter().map(Value::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn form_fields_expand_arrays() {
        let body = RequestBody::encode(
            RequestDataType::FormData,
            &json!({"id": 22, "name": "Ada", "tags": ["a", "b"], "missing": null}),
        )
        .unwrap();

        let RequestBody::Form(mut fields) = body else { panic!("expected a form") };
        fields.sort();

        assert_eq!(
            fields,
            [
                ("id".to_owned(), "22".to_owned()),
                ("missing".to_owned(), "null".to_owned()),
                ("name".to_owned(), "Ada".to_owned()),
                ("tags".to_owned(), "a".to_owned()),
                ("tags".to_owned(), "b".to_owned()),
            ]
        );
    }

    #[test]
    fn form_needs_an_object() {
        assert!(matches!(
            RequestBody::encode(RequestDataType::FormData, &[1, 2]),
            Err(Error::EncodeBody(_))
        ));
    }

    #[test]
    fn body_errors() {
        let body = ResponseBody::Json(json!({"errors": ["first", {"code": 7}]}));
        assert_eq!(
            body.errors(),
            Some(vec!["first".to_owned(), r#"{"code":7}"#.to_owned()])
        );

        assert_eq!(ResponseBody::Json(json!({"errors": []})).errors(), None);
        assert_eq!(ResponseBody::Text("errors".to_owned()).errors(), None);
    }

    #[test]
    fn empty_json_does_not_parse() {
        assert!(ResponseBody::parse(ResponseDataType::Json, b"").is_err());
        assert_eq!(
            ResponseBody::parse(ResponseDataType::Text, b"").unwrap(),
            ResponseBody::Text(String::new())
        );
    }
}
