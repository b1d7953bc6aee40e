//! Wire types for the query endpoints. Client → server JSON body, server → client
//! event lines and result records.

use serde::{Deserialize, Serialize};

/// Prefix of every event line in the streamed body.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the logical end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Client → server: query body for both endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
}

impl<'a> QueryRequest<'a> {
    pub fn new(query: &'a str) -> Self {
        Self { query }
    }
}

/// Server → client: one streamed record.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRecord {
    #[serde(default)]
    pub content: Option<String>,
}

/// Server → client: answer record of the non-streaming endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub original_query: String,
    #[serde(default)]
    pub subqueries: Vec<String>,
    #[serde(default)]
    pub context: String,
    pub final_answer: String,
}

/// Envelope around [`QueryResult`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub results: QueryResult,
}

/// One decoded line of the streamed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text fragment to append to the answer.
    Content(String),
    /// `[DONE]` sentinel.
    Done,
    /// Record parsed but carried no `content`.
    Empty,
    /// Payload that is not a valid record; carries the payload for logging.
    Malformed(String),
}

impl StreamEvent {
    /// Decode one complete line. Returns `None` for lines that are not event
    /// lines (blank separators, comments, other fields).
    pub fn from_line(line: &str) -> Option<Self> {
        let payload = line.strip_prefix(DATA_PREFIX)?;
        if payload.trim() == DONE_SENTINEL {
            return Some(StreamEvent::Done);
        }
        match serde_json::from_str::<ContentRecord>(payload) {
            Ok(ContentRecord {
                content: Some(content),
            }) => Some(StreamEvent::Content(content)),
            Ok(ContentRecord { content: None }) => Some(StreamEvent::Empty),
            Err(_) => Some(StreamEvent::Malformed(payload.to_string())),
        }
    }
}
