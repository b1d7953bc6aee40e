//! Integration tests for the kb-chat binary.
//! Uses assert_cmd to run the binary, a real temp config, and an in-process
//! HTTP server. No mocks.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write as _;
use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Pick a free port by binding to :0 and extracting the assigned port.
fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Write a minimal YAML config to a temp file pointing at `port`.
fn write_config(dir: &tempfile::TempDir, port: u16, company: Option<&str>) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "endpoint:\n  base_url: http://127.0.0.1:{}", port).unwrap();
    if let Some(company) = company {
        writeln!(f, "tenant:\n  company: {}", company).unwrap();
    }
    path
}

/// Spawn a minimal HTTP server that answers every request with a streamed
/// answer of two fragments and the end sentinel. Counts accepted connections.
fn spawn_test_server(port: u16) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
                .await
                .unwrap();
            loop {
                let (mut tcp, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);

                // Read until the JSON body has arrived.
                let mut buf = Vec::new();
                let mut tmp = [0u8; 1024];
                while !buf.ends_with(b"}") {
                    let n = tcp.read(&mut tmp).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&tmp[..n]);
                }

                let body = "data: {\"content\":\"Test \"}\n\ndata: {\"content\":\"answer.\"}\n\ndata: [DONE]\n\n";
                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = tcp.write_all(resp.as_bytes()).await;
                let _ = tcp.shutdown().await;
            }
        });
    });
    hits
}

#[test]
fn prints_streamed_answer() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port, Some("acme"));

    let _hits = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("kb-chat"));
    cmd.arg("--config")
        .arg(&config_path)
        .write_stdin("What is the answer?\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Test answer."));
}

#[test]
fn positional_question_and_config_env_var() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port, None);

    let _hits = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("kb-chat"));
    cmd.env("KB_CHAT_CONFIG", &config_path)
        .arg("--page-url")
        .arg("https://chat.example.com/?company=acme")
        .arg("What is the answer?");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Test answer."));
}

#[test]
fn missing_company_refuses_without_request() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port, None);

    let hits = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("kb-chat"));
    cmd.arg("--config").arg(&config_path).arg("hello");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("administrator"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_question_never_dispatches() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port, Some("acme"));

    let hits = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("kb-chat"));
    cmd.arg("--config").arg(&config_path).write_stdin("   \n");

    cmd.assert().failure();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn server_down_shows_error() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port, Some("acme"));

    let mut cmd = Command::from(cargo_bin_cmd!("kb-chat"));
    cmd.arg("--config").arg(&config_path).write_stdin("hello\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::is_match("(?i)(failed|error|refused)").unwrap());
}
