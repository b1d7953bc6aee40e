//! One chat form's state and its submission task.
//!
//! The session owns the query text, the loading and streaming flags, the
//! accumulated answer, and the notices raised by failed submissions. Every
//! mutation goes through `&mut self`, so only one submission can be in flight.

use futures_util::StreamExt;
use kb_chat_client::{Answer, Client, ClientError};
use serde::{Deserialize, Serialize};

/// Category of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Timeout,
    Status,
    Failure,
}

/// Non-blocking notification shown after a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn from_error(err: &ClientError) -> Self {
        let kind = match err {
            ClientError::Timeout => NoticeKind::Timeout,
            ClientError::Status { .. } => NoticeKind::Status,
            _ => NoticeKind::Failure,
        };
        Notice {
            kind,
            message: err.user_message(),
        }
    }
}

/// How a call to [`ChatSession::submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Query was empty; nothing was sent and no notice was raised.
    Rejected,
    /// The stream ended, with or without the end sentinel.
    Completed,
    /// A notice was raised; the answer keeps whatever arrived before the failure.
    Failed,
}

/// Serializable view of the session for a frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub query: String,
    pub loading: bool,
    pub streaming: bool,
    pub answer: String,
    pub can_submit: bool,
    pub notices: Vec<Notice>,
}

/// State of the interactive chat form.
#[derive(Debug)]
pub struct ChatSession {
    client: Client,
    query: String,
    loading: bool,
    streaming: bool,
    answer: Answer,
    notices: Vec<Notice>,
}

impl ChatSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            query: String::new(),
            loading: false,
            streaming: false,
            answer: Answer::new(),
            notices: Vec::new(),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn answer(&self) -> &str {
        self.answer.as_str()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Remove and return pending notices, e.g. once they have been displayed.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.streaming && !self.query.trim().is_empty()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            query: self.query.clone(),
            loading: self.loading,
            streaming: self.streaming,
            answer: self.answer.as_str().to_string(),
            can_submit: self.can_submit(),
            notices: self.notices.clone(),
        }
    }

    /// Submit the current query, accumulating the streamed answer.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.submit_with(|_| {}).await
    }

    /// Submit the current query, calling `on_update` with the full answer so
    /// far after each fragment.
    pub async fn submit_with<F>(&mut self, mut on_update: F) -> SubmitOutcome
    where
        F: FnMut(&str),
    {
        if self.query.trim().is_empty() {
            return SubmitOutcome::Rejected;
        }
        let query = std::mem::take(&mut self.query);
        self.answer.clear();
        self.loading = true;

        let result = self.run(&query, &mut on_update).await;

        self.loading = false;
        self.streaming = false;

        match result {
            Ok(()) => SubmitOutcome::Completed,
            Err(ClientError::EmptyQuery) => SubmitOutcome::Rejected,
            Err(err) => {
                tracing::error!(error = %err, "chat submission failed");
                self.notices.push(Notice::from_error(&err));
                SubmitOutcome::Failed
            }
        }
    }

    async fn run<F>(&mut self, query: &str, on_update: &mut F) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        let mut fragments = self.client.ask(query).await?;
        self.loading = false;
        self.streaming = true;
        while let Some(fragment) = fragments.next().await {
            self.answer.push(&fragment?);
            on_update(self.answer.as_str());
        }
        tracing::debug!(len = self.answer.as_str().len(), "answer complete");
        Ok(())
    }
}
