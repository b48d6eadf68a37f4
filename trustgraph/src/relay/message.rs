//! NIP-01 client and relay message framing.
//!
//! Client -> relay: `["REQ", <sub>, <filter>]`, `["CLOSE", <sub>]`.
//! Relay -> client: `["EVENT", <sub>, <event>]`, `["EOSE", <sub>]`,
//! `["CLOSED", <sub>, <msg>]`, `["NOTICE", <msg>]`.

use serde_json::Value;

use crate::event::{Event, Filter};

/// Messages this client sends.
#[derive(Debug, Clone)]
pub enum ClientMessage<'a> {
    Req { subscription_id: &'a str, filter: &'a Filter },
    Close { subscription_id: &'a str },
}

impl ClientMessage<'_> {
    /// Serialize to the JSON array text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let value = match self {
            ClientMessage::Req {
                subscription_id,
                filter,
            } => Value::Array(vec![
                Value::String("REQ".into()),
                Value::String((*subscription_id).into()),
                serde_json::to_value(filter)?,
            ]),
            ClientMessage::Close { subscription_id } => Value::Array(vec![
                Value::String("CLOSE".into()),
                Value::String((*subscription_id).into()),
            ]),
        };
        serde_json::to_string(&value)
    }
}

/// Messages a relay may send.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    EndOfStoredEvents {
        subscription_id: String,
    },
    Closed {
        subscription_id: String,
        message: String,
    },
    Notice {
        message: String,
    },
    /// Valid JSON array with a label we do not handle (`OK`, `AUTH`, ...)
    Unhandled(String),
}

/// Frame could not be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed frame: {0}")]
    Malformed(&'static str),
}

impl RelayMessage {
    /// Parse a text frame received from a relay.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        let mut items = match value {
            Value::Array(items) => items.into_iter(),
            _ => return Err(FrameError::Malformed("expected array")),
        };

        let label = match items.next() {
            Some(Value::String(label)) => label,
            _ => return Err(FrameError::Malformed("missing label")),
        };

        match label.as_str() {
            "EVENT" => {
                let subscription_id = next_string(&mut items, "missing subscription id")?;
                let event = items
                    .next()
                    .ok_or(FrameError::Malformed("missing event"))?;
                let event: Event = serde_json::from_value(event)?;
                Ok(RelayMessage::Event {
                    subscription_id,
                    event: Box::new(event),
                })
            }
            "EOSE" => Ok(RelayMessage::EndOfStoredEvents {
                subscription_id: next_string(&mut items, "missing subscription id")?,
            }),
            "CLOSED" => Ok(RelayMessage::Closed {
                subscription_id: next_string(&mut items, "missing subscription id")?,
                message: next_string(&mut items, "missing message").unwrap_or_default(),
            }),
            "NOTICE" => Ok(RelayMessage::Notice {
                message: next_string(&mut items, "missing message")?,
            }),
            _ => Ok(RelayMessage::Unhandled(label)),
        }
    }
}

fn next_string(
    items: &mut impl Iterator<Item = Value>,
    missing: &'static str,
) -> Result<String, FrameError> {
    match items.next() {
        Some(Value::String(s)) => Ok(s),
        _ => Err(FrameError::Malformed(missing)),
    }
}
