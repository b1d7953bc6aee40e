//! Decide what the widget shows for a page load.

use kb_chat_client::{tenant_from_page_url, Client, ClientOptions};

use crate::session::ChatSession;

/// Shown instead of the form when the page URL carries no company identifier.
pub const MISSING_TENANT_MESSAGE: &str =
    "This chat link is missing its company identifier. Please contact your administrator.";

/// What a page load renders.
#[derive(Debug)]
pub enum WidgetView {
    /// Interactive form bound to the tenant from the page URL.
    Form(ChatSession),
    /// Static error; no request will ever be made from this view.
    ConfigError(String),
}

impl WidgetView {
    pub fn is_form(&self) -> bool {
        matches!(self, WidgetView::Form(_))
    }
}

/// Build the view for `page_url`. `options` supplies the endpoint and timeout;
/// its tenant is replaced by the one in the page URL.
pub fn launch(page_url: &str, mut options: ClientOptions) -> WidgetView {
    let Some(tenant) = tenant_from_page_url(page_url) else {
        tracing::warn!(%page_url, "no company identifier in page URL");
        return WidgetView::ConfigError(MISSING_TENANT_MESSAGE.to_string());
    };
    options.tenant = Some(tenant);
    match Client::new(options) {
        Ok(client) => WidgetView::Form(ChatSession::new(client)),
        Err(e) => {
            tracing::error!(error = %e, "chat client setup failed");
            WidgetView::ConfigError(format!("Chat is unavailable: {}", e))
        }
    }
}
