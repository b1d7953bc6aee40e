//! Knowledge-base chat client library (config, query dispatch, streamed answer handling).
//! Used by the chat widget and the `kb-chat` CLI.

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod sse;
pub mod stream;

pub use client::{for_each_fragment, Client, ClientOptions, TENANT_HEADER};
pub use config::{default_config_path, tenant_from_page_url, Config, ConfigError, EndpointSection, TenantSection};
pub use error::ClientError;
pub use messages::{QueryResult, StreamEvent};
pub use stream::{collect_answer, fragments, Answer, FragmentStream};
