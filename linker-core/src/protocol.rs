//! Wire protocol spoken with the native prediction host.
//!
//! Requests are tagged by a `Type` field. Responses are **not** tagged: the
//! service never echoes the request type back, so inbound frames are told apart
//! by shape alone:
//!
//! | Shape                        | Meaning                                   |
//! |------------------------------|-------------------------------------------|
//! | has `Threshold`              | reply to `Threshold`                      |
//! | has `Suggestions`            | reply to `Prediction`                     |
//! | anything else (object)       | acknowledgement of `LinkUpdate`/`Update`  |
//!
//! The service answers requests one-for-one and in submission order. That is a
//! property of the host that this crate relies on, not something it re-checks.
//!
//! Frames use browser native-messaging framing: a `u32` byte length in native
//! byte order followed by that many bytes of UTF-8 JSON.

use std::io::{ErrorKind, Read, Write};

use serde::Serialize;
use serde_json::Value;

use crate::error::LinkerError;
use crate::types::{Context, ContextKind, LinkEdge, PredictionResult, ThresholdHint};

/// Largest frame accepted from the host (the browser's host-to-client limit).
pub const MAX_INBOUND_FRAME: usize = 1024 * 1024;

/// One outbound message to the prediction host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type")]
pub enum Request {
    Prediction {
        #[serde(rename = "Repository")]
        repository: String,
        #[serde(rename = "PR")]
        pr: Option<String>,
        #[serde(rename = "Issue")]
        issue: Option<String>,
    },
    Update,
    Threshold {
        #[serde(rename = "Repository")]
        repository: String,
    },
    LinkUpdate {
        #[serde(rename = "Repository")]
        repository: String,
        #[serde(rename = "Links")]
        links: Vec<LinkEdge>,
    },
}

impl Request {
    /// Builds a prediction request with exactly one of `PR` / `Issue` populated.
    pub fn prediction(context: &Context) -> Self {
        let id = Some(context.local_id.clone());
        let (pr, issue) = match context.kind {
            ContextKind::PullRequest => (id, None),
            ContextKind::Issue => (None, id),
        };
        Request::Prediction { repository: context.repository.clone(), pr, issue }
    }

    /// The `Type` discriminant, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Request::Prediction { .. } => "Prediction",
            Request::Update => "Update",
            Request::Threshold { .. } => "Threshold",
            Request::LinkUpdate { .. } => "LinkUpdate",
        }
    }
}

/// A reply shape that carries a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Prediction,
    Threshold,
}

impl Shape {
    pub fn label(self) -> &'static str {
        match self {
            Shape::Prediction => "prediction",
            Shape::Threshold => "threshold",
        }
    }
}

/// An inbound message, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Prediction(PredictionResult),
    Threshold(ThresholdHint),
    Acknowledged { error: Option<String> },
    /// The shape was recognised but its payload did not decode.
    Malformed { shape: Shape, reason: String },
}

impl Response {
    /// Classifies a decoded JSON frame.
    ///
    /// # Errors
    ///
    /// Returns `LinkerError::Protocol` when the frame is not an object. A
    /// recognised shape with a bad payload is `Response::Malformed`, so the
    /// caller can still settle the request it answers.
    pub fn classify(value: Value) -> Result<Self, LinkerError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(LinkerError::Protocol(format!("expected a JSON object, got {other}")));
            }
        };

        if let Some(raw) = map.get("Threshold") {
            return Ok(match raw.as_f64() {
                Some(value) => Response::Threshold(ThresholdHint { value: value.clamp(0.0, 1.0) }),
                None => Response::Malformed {
                    shape: Shape::Threshold,
                    reason: format!("Threshold is not a number: {raw}"),
                },
            });
        }

        if map.contains_key("Suggestions") {
            return Ok(match serde_json::from_value::<PredictionResult>(Value::Object(map)) {
                Ok(result) => Response::Prediction(result),
                Err(e) => Response::Malformed { shape: Shape::Prediction, reason: e.to_string() },
            });
        }

        let error = map.get("Error").and_then(Value::as_str).map(str::to_owned);
        Ok(Response::Acknowledged { error })
    }
}

/// Writes one native-messaging frame.
///
/// # Errors
///
/// Returns `LinkerError::Io` if the writer fails, `LinkerError::Protocol` if the
/// request cannot be encoded or exceeds `u32::MAX` bytes.
pub fn write_frame<W: Write>(writer: &mut W, request: &Request) -> Result<(), LinkerError> {
    let body = serde_json::to_vec(request)
        .map_err(|e| LinkerError::Protocol(format!("failed to encode {}: {e}", request.type_name())))?;
    let len = u32::try_from(body.len())
        .map_err(|_| LinkerError::Protocol(format!("{} frame too large", request.type_name())))?;
    writer.write_all(&len.to_ne_bytes())?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

/// Reads one native-messaging frame.
///
/// Returns `Ok(None)` on a clean end of stream (EOF before the length prefix).
///
/// # Errors
///
/// Returns `LinkerError::Io` on a truncated frame or read failure, and
/// `LinkerError::Protocol` for oversize or non-JSON frames.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Value>, LinkerError> {
    let mut prefix = [0_u8; 4];
    match reader.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_ne_bytes(prefix) as usize;
    if len > MAX_INBOUND_FRAME {
        return Err(LinkerError::Protocol(format!(
            "inbound frame of {len} bytes exceeds the {MAX_INBOUND_FRAME} byte limit"
        )));
    }

    let mut body = vec![0_u8; len];
    reader.read_exact(&mut body)?;
    let value = serde_json::from_slice(&body)
        .map_err(|e| LinkerError::Protocol(format!("inbound frame is not JSON: {e}")))?;
    Ok(Some(value))
}
