//! Response model for the etcd v2 API
//!
//! Every successful API call yields one JSON object. [`Response`] keeps
//! that payload intact: the raw body text is retained verbatim and the
//! parsed object is exposed field by field, without reshaping what the
//! server sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::transport::RawResponse;

/// Parsed view over one etcd response body.
///
/// A `Response` is only ever built from a payload that is a JSON object
/// free of `errorCode`; error payloads and non-object bodies are rejected
/// during parsing. `Display` reproduces the body exactly as received, so
/// a response can be serialized and parsed back without loss.
#[derive(Debug, Clone)]
pub struct Response {
    content: String,
    payload: Map<String, Value>,
}

impl Response {
    /// Parse a completed HTTP exchange.
    ///
    /// The HTTP status is deliberately ignored: etcd reports failures via
    /// the `errorCode` payload, which surfaces here as
    /// [`Error::Service`].
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        let content = String::from_utf8(raw.body.to_vec())
            .map_err(|e| Error::Malformed(format!("Response body is not valid UTF-8: {}", e)))?;
        content.parse()
    }

    /// Raw response body exactly as received.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Top-level payload field by name.
    ///
    /// Pass-through surface for fields without a dedicated accessor.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Action performed, present on keyspace operations (`get`, `set`,
    /// `delete`, ...).
    pub fn action(&self) -> Option<&str> {
        self.str_field("action")
    }

    /// Current state of the key, passed through unreshaped.
    pub fn node(&self) -> Option<&Map<String, Value>> {
        self.map_field("node")
    }

    /// State of the key before a mutating operation.
    pub fn prev_node(&self) -> Option<&Map<String, Value>> {
        self.map_field("prevNode")
    }

    /// Server version, from the version endpoint.
    pub fn etcdserver(&self) -> Option<&str> {
        self.str_field("etcdserver")
    }

    /// Cluster version, from the version endpoint.
    pub fn etcdcluster(&self) -> Option<&str> {
        self.str_field("etcdcluster")
    }

    /// Leader member id, from the leader-stats endpoint.
    pub fn leader(&self) -> Option<&str> {
        self.str_field("leader")
    }

    /// Per-follower counters and latency, from the leader-stats endpoint.
    pub fn followers(&self) -> Option<&Map<String, Value>> {
        self.map_field("followers")
    }

    /// Member id, from the self-stats endpoint.
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// Member name, from the self-stats endpoint.
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Raft state of the member (`StateLeader` or `StateFollower`), from
    /// the self-stats endpoint.
    pub fn state(&self) -> Option<&str> {
        self.str_field("state")
    }

    /// Member start time, from the self-stats endpoint.
    pub fn start_time(&self) -> Option<&str> {
        self.str_field("startTime")
    }

    /// Leader info block, from the self-stats endpoint.
    pub fn leader_info(&self) -> Option<&Map<String, Value>> {
        self.map_field("leaderInfo")
    }

    /// Append requests received by the member, from the self-stats
    /// endpoint.
    pub fn recv_append_request_cnt(&self) -> Option<u64> {
        self.payload.get("recvAppendRequestCnt").and_then(Value::as_u64)
    }

    /// Append requests sent by the member, from the self-stats endpoint.
    pub fn send_append_request_cnt(&self) -> Option<u64> {
        self.payload.get("sendAppendRequestCnt").and_then(Value::as_u64)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    fn map_field(&self, key: &str) -> Option<&Map<String, Value>> {
        self.payload.get(key).and_then(Value::as_object)
    }
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::Malformed(format!("Invalid JSON payload: {}", e)))?;
        let payload = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::Malformed(format!(
                    "Expected a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };
        if payload.contains_key("errorCode") {
            return Err(service_error(&payload));
        }
        Ok(Response {
            content: content.to_string(),
            payload,
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convert an `errorCode` payload into the service error it encodes.
/// Any payload carrying `errorCode` is an error, whatever the code and
/// whichever companion fields are present.
fn service_error(payload: &Map<String, Value>) -> Error {
    Error::Service {
        code: payload.get("errorCode").and_then(Value::as_u64).unwrap_or(0),
        message: payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        cause: payload
            .get("cause")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        index: payload.get("index").and_then(Value::as_u64),
    }
}

/// Typed view of one keyspace entry (`node` or `prevNode`).
///
/// The accessors on [`Response`] pass node mappings through untouched;
/// `Node` is the optional typed reading of such a mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Key path, e.g. `/message`.
    pub key: Option<String>,
    /// Value stored under the key; absent for directories.
    pub value: Option<String>,
    /// Index at which the key was created.
    pub created_index: Option<u64>,
    /// Index of the last modification of the key.
    pub modified_index: Option<u64>,
    /// Remaining time to live in seconds, if the key expires.
    pub ttl: Option<i64>,
    /// Absolute expiration timestamp, if the key expires.
    pub expiration: Option<String>,
    /// Whether the entry is a directory.
    #[serde(default)]
    pub dir: bool,
}

impl Node {
    /// Build a typed node from the verbatim mapping of a [`Response`].
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(mapping.clone()))
            .map_err(|e| Error::Malformed(format!("Invalid node mapping: {}", e)))
    }
}
