//! Integration tests for the TCP gateway
//!
//! These tests start a real server on an ephemeral port and drive it with one or
//! more clients over newline-delimited JSON.

use anyhow::Result;
use std::net::SocketAddr;
use switchboard_call_engine::prelude::*;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    dispatcher: DispatcherHandle,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<switchboard_call_engine::Result<()>>,
}

impl TestServer {
    async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        self.task.await??;
        Ok(())
    }
}

async fn start_test_server(num_operators: usize) -> Result<TestServer> {
    let _ = tracing_subscriber_init();

    let mut config = CallCenterConfig::default();
    config.dispatcher.num_operators = num_operators;
    config.server.bind_addr = "127.0.0.1:0".parse()?;

    let server = CallCenterServer::bind(&config).await?;
    let addr = server.local_addr()?;
    let dispatcher = server.dispatcher();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(server.run_until(async {
        let _ = shutdown_rx.await;
    }));

    Ok(TestServer {
        addr,
        dispatcher,
        shutdown_tx,
        task,
    })
}

fn tracing_subscriber_init() -> switchboard_call_engine::Result<()> {
    use switchboard_call_engine::logging::{setup_logging, LoggingConfig};
    setup_logging(LoggingConfig::new(tracing::Level::DEBUG).with_file_info())
}

async fn responses(client: &mut CallCenterClient, count: usize) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let response = client
            .read_response()
            .await?
            .ok_or_else(|| anyhow::anyhow!("server closed the connection"))?;
        out.push(response.response);
    }
    Ok(out)
}

async fn send(client: &mut CallCenterClient, line: &str, expect: usize) -> Result<Vec<String>> {
    let command = match switchboard_call_engine::prompt::parse_line(line)? {
        switchboard_call_engine::prompt::PromptLine::Command(command) => command,
        other => anyhow::bail!("not a command: {:?}", other),
    };
    client.send(&command).await?;
    responses(client, expect).await
}

#[tokio::test]
async fn test_single_client_scenario() -> Result<()> {
    let server = start_test_server(2).await?;
    let mut client = CallCenterClient::connect(server.addr).await?;

    assert_eq!(send(&mut client, "call 1", 2).await?, ["Call 1 received", "Call 1 ringing for operator A"]);
    assert_eq!(send(&mut client, "call 2", 2).await?, ["Call 2 received", "Call 2 ringing for operator B"]);
    assert_eq!(send(&mut client, "call 3", 2).await?, ["Call 3 received", "Call 3 waiting in queue"]);
    assert_eq!(send(&mut client, "hangup 1", 2).await?, ["Call 1 missed", "Call 3 ringing for operator A"]);
    assert_eq!(send(&mut client, "answer A", 1).await?, ["Call 3 answered by operator A"]);
    assert_eq!(send(&mut client, "hangup 3", 1).await?, ["Call 3 finished and operator A available"]);
    assert_eq!(
        send(&mut client, "reject B", 2).await?,
        ["Call 2 rejected by operator B", "Call 2 ringing for operator A"]
    );

    server.shutdown().await
}

#[tokio::test]
async fn test_bad_requests_get_error_responses() -> Result<()> {
    let server = start_test_server(1).await?;
    let mut client = CallCenterClient::connect(server.addr).await?;

    client.send_raw("this is not json").await?;
    let reply = responses(&mut client, 1).await?;
    assert!(reply[0].starts_with("Error: Malformed event"), "{:?}", reply);

    client.send_raw(r#"{"command": "transfer", "id": "1"}"#).await?;
    assert!(responses(&mut client, 1).await?[0].starts_with("Error: Malformed event"));

    client.send_raw(r#"{"command": "answer", "id": "Q"}"#).await?;
    assert!(responses(&mut client, 1).await?[0].starts_with("Error: Unknown operator"));

    client.send_raw(r#"{"command": "hangup", "id": "8"}"#).await?;
    assert!(responses(&mut client, 1).await?[0].starts_with("Error: Invalid transition"));

    // the connection and the dispatcher are still fine
    client.send_raw(r#"{"command": "call", "id": 8}"#).await?;
    assert_eq!(
        responses(&mut client, 2).await?,
        ["Call 8 received", "Call 8 ringing for operator A"]
    );

    let stats = server.dispatcher.stats().await?;
    assert_eq!(stats.ringing, 1);
    server.shutdown().await
}

#[tokio::test]
async fn test_clients_share_one_dispatcher() -> Result<()> {
    let server = start_test_server(1).await?;
    let mut caller = CallCenterClient::connect(server.addr).await?;
    let mut operator = CallCenterClient::connect(server.addr).await?;

    send(&mut caller, "call 1", 2).await?;
    assert_eq!(
        send(&mut caller, "call 2", 2).await?,
        ["Call 2 received", "Call 2 waiting in queue"]
    );

    // a second connection sees the call placed by the first
    assert_eq!(send(&mut operator, "answer A", 1).await?, ["Call 1 answered by operator A"]);
    assert_eq!(
        send(&mut operator, "hangup 1", 2).await?,
        ["Call 1 finished and operator A available", "Call 2 ringing for operator A"]
    );

    let stats = server.dispatcher.stats().await?;
    assert_eq!(stats.ringing, 1);
    assert_eq!(stats.queued_calls, 0);
    server.shutdown().await
}

#[tokio::test]
async fn test_concurrent_calls_are_serialized() -> Result<()> {
    let server = start_test_server(3).await?;

    let mut tasks = Vec::new();
    for client_no in 0..5i64 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let mut client = CallCenterClient::connect(addr).await?;
            for n in 0..4i64 {
                let id = client_no * 100 + n;
                let out = send(&mut client, &format!("call {}", id), 2).await?;
                anyhow::ensure!(out[0] == format!("Call {} received", id), "unexpected reply {:?}", out);
            }
            Ok::<_, anyhow::Error>(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    let stats = server.dispatcher.stats().await?;
    assert_eq!(stats.ringing, 3);
    assert_eq!(stats.queued_calls, 17);
    server.shutdown().await
}
