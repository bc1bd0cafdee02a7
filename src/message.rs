//! The message envelope exchanged with the server.
//!
//! A [`Message`] is a JSON object. The `Host` member identifies the sending
//! agent and is stamped by the send worker; every other top-level member is
//! opaque payload that only the request handler interprets.
//!
//! `Host` is never part of the payload map: the constructors move it into
//! [`Message::host`] and serialization writes it exactly once.

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};

/// Object key carrying the sender identity.
pub const HOST_KEY: &str = "Host";

/// One discrete unit exchanged over the framed transport.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use warplink::Message;
///
/// let message = Message::new().with_field("Command", json!("uptime"));
/// assert_eq!(message.field("Command"), Some(&json!("uptime")));
/// assert!(message.host.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Message {
    /// Identity of the agent that sent the message.
    #[serde(rename = "Host", default)]
    pub host: String,
    /// Remaining members of the JSON object. A `Host` entry here is ignored
    /// when serializing.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Message {
    /// Create an empty message with no host and no payload.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a message from an existing payload map.
    ///
    /// A `Host` member in `body` becomes the message host.
    #[must_use]
    pub fn from_body(mut body: Map<String, Value>) -> Self {
        let host = body.remove(HOST_KEY).map(host_text).unwrap_or_default();
        Self { host, body }
    }

    /// Add or replace a payload member.
    ///
    /// `Host` sets [`Message::host`] instead of the payload.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key == HOST_KEY {
            self.host = host_text(value);
        } else {
            self.body.insert(key, value);
        }
        self
    }

    /// Look up a payload member.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> { self.body.get(key) }

    /// Overwrite the `Host` member, discarding any `Host` left in the payload.
    pub fn stamp_host(&mut self, host: &str) {
        self.body.remove(HOST_KEY);
        host.clone_into(&mut self.host);
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let payload = self.body.iter().filter(|(key, _)| key.as_str() != HOST_KEY);
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(HOST_KEY, &self.host)?;
        for (key, value) in payload {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn host_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
