//! Maps a parsed request to its response payload
//!
//! Only `chat` has a side effect (a chat log append) and only `quit` changes
//! what happens to the connection afterwards; every other request type is a
//! plain computation over the request and the quote bank.

use crate::chat_log::{ChatLog, ChatLogEntry};
use crate::quotes::QuoteBank;
use crate::utils::friendly_now;
use log::debug;
use serde_json::{json, Value};
use shared::{Request, RequestKind, Response, DEFAULT_COLOR};
use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),
    #[error("could not convert {value} to a number")]
    InvalidNumber { field: String, value: String },
    #[error("sum of {a:e} and {b:e} is out of range")]
    SumOutOfRange { a: f64, b: f64 },
    #[error("No quotes available.")]
    NoQuotes,
    #[error("chat log unavailable: {0}")]
    ChatLog(#[from] io::Error),
}

/// A routed response and whether the connection should close once it is sent
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub response: Response,
    pub close: bool,
}

/// Coerces an optional request field to a float; absent fields count as 0
///
/// Numbers pass through, numeric strings are parsed, booleans become 1 or 0.
/// Anything else, including strings spelling out NaN or infinity, fails with
/// [`RouterError::InvalidNumber`].
pub fn coerce_number(field: &str, value: Option<&Value>) -> Result<f64, RouterError> {
    let invalid = |value: &Value| RouterError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    };

    let Some(value) = value else {
        return Ok(0.0);
    };

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(value)),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid(value)),
        _ => Err(invalid(value)),
    }
}

/// Dispatches requests to their handlers
///
/// Holds the two resources requests read from: the chat log and the quote
/// bank. Routing never fails; errors become `error` responses.
pub struct RequestRouter {
    chat_log: Arc<ChatLog>,
    quotes: Arc<QuoteBank>,
}

impl RequestRouter {
    /// Creates a router sharing `chat_log` and `quotes` with the rest of the server
    pub fn new(chat_log: Arc<ChatLog>, quotes: Arc<QuoteBank>) -> Self {
        Self { chat_log, quotes }
    }

    pub fn chat_log(&self) -> &ChatLog {
        &self.chat_log
    }

    pub fn quotes(&self) -> &QuoteBank {
        &self.quotes
    }

    /// Produces exactly one response for `request`
    ///
    /// Unknown types, bad numbers and an empty quote bank are reported as
    /// `error` responses. `close` is set only for `quit`.
    pub async fn route(&self, request: &Request) -> Routed {
        let close = request.known_kind() == Some(RequestKind::Quit);

        let response = match self.dispatch(request).await {
            Ok(data) => Response::ok(data),
            Err(e) => {
                debug!("Request '{}' failed: {}", request.kind, e);
                Response::error(e.to_string())
            }
        };

        Routed { response, close }
    }

    async fn dispatch(&self, request: &Request) -> Result<Value, RouterError> {
        match request.known_kind() {
            Some(RequestKind::Chat) => self.chat(request).await,
            Some(RequestKind::Time) => Ok(json!({ "server_time": friendly_now() })),
            Some(RequestKind::Math) => math(request),
            Some(RequestKind::Quote) => self.quote(),
            Some(RequestKind::History) => Ok(json!({ "history": self.chat_log.read_all().await? })),
            Some(RequestKind::Quit) => Ok(json!({ "message": "Goodbye!" })),
            None => Err(RouterError::UnknownRequestType(request.kind.clone())),
        }
    }

    async fn chat(&self, request: &Request) -> Result<Value, RouterError> {
        let user = request.text_field("user", "Unknown");
        let message = request.text_field("message", "");
        let color = request.text_field("color", DEFAULT_COLOR);

        self.chat_log
            .append(&ChatLogEntry::now(&user, &message))
            .await?;

        Ok(json!({
            "reply": format!("{}: {}", user, message),
            "color": color,
        }))
    }

    fn quote(&self) -> Result<Value, RouterError> {
        let quote = self.quotes.random_pick().ok_or(RouterError::NoQuotes)?;
        Ok(json!({ "quote": quote }))
    }
}

fn math(request: &Request) -> Result<Value, RouterError> {
    let a = coerce_number("a", request.field("a"))?;
    let b = coerce_number("b", request.field("b"))?;

    let sum = a + b;
    if !sum.is_finite() {
        return Err(RouterError::SumOutOfRange { a, b });
    }
    Ok(json!({ "a": a, "b": b, "sum": sum }))
}
