//! End-to-end tests: `SessionManager` driving a `BridgeClient` against an
//! in-process fake bridge

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tether::commands::builtin_registry;
use tether::{
    AuthMode, BridgeClient, ConnectParams, ManagerConfig, RetryPolicy, RunOutcome,
    SessionManager, SessionState,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;

const STEP: Duration = Duration::from_secs(5);

fn config() -> ManagerConfig {
    let mut config = ManagerConfig::new(ConnectParams {
        host: "mc.example.net".to_string(),
        port: 25565,
        username: "Keeper".to_string(),
        password: None,
        auth: AuthMode::Offline,
        version: None,
    });
    config.retry = RetryPolicy::new(3, Duration::from_millis(50));
    config.chatter.join_message = None;
    config.rng_seed = Some(1);
    config
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct FakeBridge {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl FakeBridge {
    async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = tokio::time::timeout(STEP, listener.accept())
            .await
            .unwrap()
            .unwrap();
        let (read, write) = stream.into_split();
        Self {
            lines: BufReader::new(read).lines(),
            write,
        }
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(STEP, self.lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn send(&mut self, line: &str) {
        self.write.write_all(line.as_bytes()).await.unwrap();
        self.write.write_all(b"\n").await.unwrap();
    }
}

#[tokio::test]
async fn test_chat_command_round_trip() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = BridgeClient::new(listener.local_addr().unwrap().to_string());
    let manager = SessionManager::new(client, config(), Arc::new(builtin_registry().unwrap()));
    let mut status = manager.status();
    let shutdown = manager.shutdown_handle();
    let run = tokio::spawn(manager.run());

    let mut bridge = FakeBridge::accept(&listener).await;
    let open = bridge.recv().await;
    assert_eq!(open["type"], "open");
    assert_eq!(open["host"], "mc.example.net");
    assert_eq!(open["username"], "Keeper");

    bridge.send(r#"{"event":"login","username":"Keeper"}"#).await;
    tokio::time::timeout(STEP, status.wait_for(|s| s.state == SessionState::Connected))
        .await
        .unwrap()
        .unwrap();

    bridge
        .send(r#"{"event":"chat","username":"Steve","message":"!say hi there"}"#)
        .await;
    let chat = bridge.recv().await;
    assert_eq!(chat["type"], "chat");
    assert_eq!(chat["message"], "hi there");

    shutdown.shutdown();
    let quit = bridge.recv().await;
    assert_eq!(quit["type"], "quit");
    assert_eq!(quit["reason"], "Bot shutting down");
    assert_eq!(run.await.unwrap(), RunOutcome::Shutdown);
}

#[tokio::test]
async fn test_reconnects_after_bridge_closes() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = BridgeClient::new(listener.local_addr().unwrap().to_string());
    let manager = SessionManager::new(client, config(), Arc::new(builtin_registry().unwrap()));
    let mut status = manager.status();
    let shutdown = manager.shutdown_handle();
    let run = tokio::spawn(manager.run());

    let mut first = FakeBridge::accept(&listener).await;
    first.recv().await;
    first.send(r#"{"event":"login","username":"Keeper"}"#).await;
    tokio::time::timeout(STEP, status.wait_for(|s| s.state == SessionState::Connected))
        .await
        .unwrap()
        .unwrap();
    drop(first);

    let mut second = FakeBridge::accept(&listener).await;
    assert_eq!(second.recv().await["type"], "open");
    second.send(r#"{"event":"login","username":"Keeper"}"#).await;
    let connected = tokio::time::timeout(
        STEP,
        status.wait_for(|s| s.state == SessionState::Connected && s.attempt_count == 0),
    )
    .await
    .unwrap()
    .unwrap()
    .session;
    assert!(connected.is_some());

    shutdown.shutdown();
    assert_eq!(run.await.unwrap(), RunOutcome::Shutdown);
}

#[tokio::test]
async fn test_unreachable_bridge_exhausts_budget() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = BridgeClient::new(addr.to_string());
    let manager = SessionManager::new(client, config(), Arc::new(builtin_registry().unwrap()));

    let outcome = tokio::time::timeout(STEP, manager.run()).await.unwrap();

    assert_eq!(outcome, RunOutcome::RetriesExhausted { attempts: 3 });
}
