//! Chat widget state model: page-load gating on the company identifier and the
//! submission task that fills the answer from the stream.

pub mod launch;
pub mod session;

pub use launch::{launch, WidgetView, MISSING_TENANT_MESSAGE};
pub use session::{ChatSession, Notice, NoticeKind, SessionSnapshot, SubmitOutcome};
