//! kb-chat: ask the knowledge-base backend a question and print the streamed
//! answer to stdout. Logs go to stderr (`RUST_LOG`, default `warn`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use kb_chat_client::{config, for_each_fragment, Client, ClientError};

const MISSING_TENANT: &str =
    "No company identifier provided. Please contact your administrator for a valid chat link.";

#[derive(Debug, Parser)]
#[command(name = "kb-chat", about = "Ask the knowledge base a question")]
struct Cli {
    /// Question to ask. Read from the first line of stdin when omitted.
    question: Option<String>,

    /// Config file (default: $KB_CHAT_CONFIG, then ~/.kb-chat/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000.
    #[arg(long)]
    base_url: Option<String>,

    /// Company identifier forwarded as the tenant header.
    #[arg(long)]
    company: Option<String>,

    /// Chat page URL carrying the company identifier in its query string.
    #[arg(long, conflicts_with = "company")]
    page_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Use the non-streaming endpoint and print the final answer.
    #[arg(long)]
    complete: bool,

    /// Only check that the backend is reachable.
    #[arg(long, conflicts_with = "complete")]
    ping: bool,
}

fn resolve_config(cli: &Cli) -> Result<config::Config> {
    // 1. --config <path> flag
    if let Some(path) = &cli.config {
        return config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    // 2. KB_CHAT_CONFIG env var
    if let Some(path) = std::env::var_os("KB_CHAT_CONFIG").map(PathBuf::from) {
        return config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    // 3. Default path, optional
    match config::default_config_path() {
        Some(path) => config::load_or_default(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(config::Config::default()),
    }
}

fn read_question(cli: &Cli) -> Result<String> {
    if let Some(q) = &cli.question {
        return Ok(q.trim().to_string());
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read question from stdin")?;
    Ok(line.trim().to_string())
}

fn user_error(err: ClientError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = resolve_config(&cli)?;
    let mut options = cfg.client_options();
    if let Some(base_url) = &cli.base_url {
        options.base_url = base_url.clone();
    }
    if let Some(company) = cli.company.as_deref().map(str::trim) {
        options.tenant = Some(company.to_string()).filter(|c| !c.is_empty());
    }
    if let Some(page_url) = &cli.page_url {
        options.tenant = config::tenant_from_page_url(page_url);
    }
    if let Some(secs) = cli.timeout {
        options.timeout = Some(Duration::from_secs(secs));
    }

    let client = Client::new(options.clone())?;

    if cli.ping {
        client.ping().await.map_err(user_error)?;
        println!("ok");
        return Ok(());
    }

    if options.tenant.is_none() {
        bail!(MISSING_TENANT);
    }

    let question = read_question(&cli)?;
    if question.is_empty() {
        bail!("no question provided");
    }

    let stdout = io::stdout();
    if cli.complete {
        let result = client
            .ask_complete(&question)
            .await
            .map_err(user_error)?;
        let mut out = stdout.lock();
        writeln!(out, "{}", result.final_answer)?;
        return Ok(());
    }

    let fragments = client
        .ask(&question)
        .await
        .map_err(user_error)?;
    let mut out = stdout.lock();
    for_each_fragment(fragments, |fragment| -> Result<()> {
        write!(out, "{}", fragment)
            .and_then(|()| out.flush())
            .context("failed to write answer to stdout")
    })
    .await
    .map_err(|e| match e.downcast::<ClientError>() {
        Ok(client_err) => user_error(client_err),
        Err(other) => other,
    })?;
    writeln!(out)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
