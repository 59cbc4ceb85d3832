//! JSON request/response messages exchanged between client and server

use crate::codec::{self, CodecError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A message could not be converted to or from its JSON text
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an incoming frame could not be turned into a message
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// The request types the server understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Chat,
    Time,
    Math,
    Quote,
    History,
    Quit,
}

impl RequestKind {
    pub const ALL: [RequestKind; 6] = [
        RequestKind::Chat,
        RequestKind::Time,
        RequestKind::Math,
        RequestKind::Quote,
        RequestKind::History,
        RequestKind::Quit,
    ];

    /// Matches the exact, lowercase wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Chat => "chat",
            RequestKind::Time => "time",
            RequestKind::Math => "math",
            RequestKind::Quote => "quote",
            RequestKind::History => "history",
            RequestKind::Quit => "quit",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One client request: a `type` name plus arbitrary type-specific fields
///
/// Parsing is loose. Any JSON object is a request: a missing `type` becomes
/// the empty string, a non-string `type` keeps its JSON text (`null`, `5`),
/// and extra fields are carried along untouched. Interpreting fields is the
/// router's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type", default, deserialize_with = "kind_from_value")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Reads `type` as any JSON value, so only non-objects fail to parse
fn kind_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name,
        other => other.to_string(),
    })
}

impl Request {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Adds or replaces a field, builder style
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn chat(user: &str, message: &str, color: &str) -> Self {
        Self::new(RequestKind::Chat.as_str())
            .with_field("user", user)
            .with_field("message", message)
            .with_field("color", color)
    }

    pub fn math(a: f64, b: f64) -> Self {
        Self::new(RequestKind::Math.as_str())
            .with_field("a", a)
            .with_field("b", b)
    }

    pub fn time() -> Self {
        Self::new(RequestKind::Time.as_str())
    }

    pub fn quote() -> Self {
        Self::new(RequestKind::Quote.as_str())
    }

    pub fn history() -> Self {
        Self::new(RequestKind::History.as_str())
    }

    pub fn quit() -> Self {
        Self::new(RequestKind::Quit.as_str())
    }

    /// The known request type, if the `type` name is one
    pub fn known_kind(&self) -> Option<RequestKind> {
        RequestKind::parse(&self.kind)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A string field, falling back to `default` when absent
    ///
    /// Non-string values are rendered as their JSON text.
    pub fn text_field(&self, name: &str, default: &str) -> String {
        match self.fields.get(name) {
            None => default.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes with `type` first; a stray `type` entry in `fields` is skipped
    pub fn to_json(&self) -> String {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("type".to_string(), Value::String(self.kind.clone()));
        for (name, value) in &self.fields {
            if name != "type" {
                object.insert(name.clone(), value.clone());
            }
        }
        Value::Object(object).to_string()
    }
}

/// Outcome marker carried by every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Server reply; `data` is meaningful for `ok`, `error` for `error`
///
/// Both keys are always present on the wire, `null` when unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            status: Status::Ok,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Looks up `key` in the data object
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }

    /// Looks up a string member of the data object
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data_field(key).and_then(Value::as_str)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Serializes and obfuscates a request into one frame
pub fn encode_request(request: &Request, key: &[u8]) -> String {
    codec::encode(&request.to_json(), key)
}

/// Reverses [`encode_request`]
pub fn decode_request(wire: &str, key: &[u8]) -> Result<Request, FrameError> {
    let plaintext = codec::decode(wire, key)?;
    Ok(Request::from_json(&plaintext)?)
}

/// Serializes and obfuscates a response into one frame
pub fn encode_response(response: &Response, key: &[u8]) -> Result<String, ProtocolError> {
    Ok(codec::encode(&response.to_json()?, key))
}

/// Reverses [`encode_response`]
pub fn decode_response(wire: &str, key: &[u8]) -> Result<Response, FrameError> {
    let plaintext = codec::decode(wire, key)?;
    Ok(Response::from_json(&plaintext)?)
}
