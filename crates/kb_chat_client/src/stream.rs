//! Stream consumer: turns a response body into the ordered answer fragments.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use crate::error::{ClientError, Result};
use crate::messages::StreamEvent;
use crate::sse::LineBuffer;

/// Boxed fragment stream handed out by [`crate::Client::ask`].
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

struct Consumer<S> {
    body: Option<Pin<Box<S>>>,
    lines: LineBuffer,
    ready: VecDeque<String>,
    finished: bool,
}

impl<S> Consumer<S> {
    fn process(&mut self, lines: Vec<String>) {
        for line in lines {
            match StreamEvent::from_line(&line) {
                Some(StreamEvent::Content(fragment)) => self.ready.push_back(fragment),
                Some(StreamEvent::Done) => {
                    tracing::debug!("received end-of-stream sentinel");
                    self.finish();
                    return;
                }
                Some(StreamEvent::Malformed(payload)) => {
                    tracing::warn!(%payload, "skipping malformed stream payload");
                }
                Some(StreamEvent::Empty) | None => {}
            }
        }
    }

    /// Stop reading. Dropping the body releases the connection.
    fn finish(&mut self) {
        self.finished = true;
        self.body = None;
    }
}

/// Consume `body` lazily, yielding each `content` fragment in arrival order.
///
/// Ends after `[DONE]` or when `body` closes. A read error is yielded once and
/// ends the stream. Malformed payload lines are logged and skipped.
pub fn fragments<S, E>(body: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<ClientError>,
{
    let consumer = Consumer {
        body: Some(Box::pin(body)),
        lines: LineBuffer::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(consumer, |mut st| async move {
        loop {
            if let Some(fragment) = st.ready.pop_front() {
                return Some((Ok(fragment), st));
            }
            if st.finished {
                return None;
            }
            let Some(body) = st.body.as_mut() else {
                return None;
            };
            match body.next().await {
                Some(Ok(chunk)) => {
                    let lines = st.lines.feed(&chunk);
                    st.process(lines);
                }
                Some(Err(e)) => {
                    let err: ClientError = e.into();
                    st.finish();
                    return Some((Err(err), st));
                }
                None => {
                    tracing::debug!("response body closed");
                    st.body = None;
                    if let Some(tail) = st.lines.finish() {
                        st.process(vec![tail]);
                    }
                    st.finished = true;
                }
            }
        }
    })
}

/// The answer built up from fragments. Append-only until [`Answer::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    text: String,
}

impl Answer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Drain a fragment stream into a full answer.
pub async fn collect_answer<S>(fragments: S) -> Result<Answer>
where
    S: Stream<Item = Result<String>>,
{
    let mut fragments = std::pin::pin!(fragments);
    let mut answer = Answer::new();
    while let Some(fragment) = fragments.next().await {
        answer.push(&fragment?);
    }
    Ok(answer)
}
