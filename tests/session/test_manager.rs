//! Integration tests for `SessionManager`
//!
//! Drive the state machine through the scripted protocol client on a
//! paused clock, so backoff and scheduler timings are exact.

use std::sync::Arc;
use std::time::Duration;

use tether::commands::{
    CommandContext, CommandFuture, CommandHandler, CommandSpec, builtin_registry,
};
use tether::testing::{MockProtocolClient, OpenScript};
use tether::{
    AuthMode, ConnectParams, FaultKind, ManagerConfig, PlayerName, ProtocolEvent, ProtocolFault,
    RetryPolicy, RunOutcome, SessionManager, SessionState, SessionStatus, ShutdownHandle,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BASE_DELAY: Duration = Duration::from_secs(5);

struct Harness {
    client: MockProtocolClient,
    status: watch::Receiver<SessionStatus>,
    shutdown: ShutdownHandle,
    run: JoinHandle<RunOutcome>,
}

fn params() -> ConnectParams {
    ConnectParams {
        host: "localhost".to_string(),
        port: 25565,
        username: "Keeper".to_string(),
        password: None,
        auth: AuthMode::Offline,
        version: None,
    }
}

fn config(max_attempts: u32) -> ManagerConfig {
    let mut config = ManagerConfig::new(params());
    config.retry = RetryPolicy::new(max_attempts, BASE_DELAY);
    config.rng_seed = Some(42);
    config
}

fn start(client: MockProtocolClient, config: ManagerConfig) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = Arc::new(builtin_registry().unwrap());
    let manager = SessionManager::new(client.clone(), config, registry);
    let status = manager.status();
    let shutdown = manager.shutdown_handle();
    let run = tokio::spawn(manager.run());
    Harness {
        client,
        status,
        shutdown,
        run,
    }
}

impl Harness {
    async fn wait_for(&mut self, check: impl FnMut(&SessionStatus) -> bool) -> SessionStatus {
        *self.status.wait_for(check).await.unwrap()
    }

    async fn connected(&mut self) -> SessionStatus {
        self.wait_for(|s| s.state == SessionState::Connected).await
    }

    fn emit(&self, index: usize, event: ProtocolEvent) {
        assert!(self.client.emit(index, event), "manager stopped");
    }

    fn chat(&self, index: usize, sender: &str, text: &str) {
        self.emit(
            index,
            ProtocolEvent::ChatReceived {
                sender: sender.to_string(),
                text: text.to_string(),
            },
        );
    }
}

/// Let the manager drain its queue
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn ended(reason: &str) -> ProtocolEvent {
    ProtocolEvent::SessionEnded {
        reason: reason.to_string(),
    }
}

// ============================================================================
// Retry and backoff
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhaustion() {
    let h = start(MockProtocolClient::with_fallback(OpenScript::refused()), config(3));

    let outcome = h.run.await.unwrap();

    assert_eq!(outcome, RunOutcome::RetriesExhausted { attempts: 3 });
    assert_eq!(outcome.exit_status(), 1);
    // Initial attempt plus three reconnects, never a fifth
    assert_eq!(h.client.open_count(), 4);
    assert_eq!(h.status.borrow().state, SessionState::Disconnected);

    let times = h.client.open_times();
    let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(gaps, vec![BASE_DELAY, BASE_DELAY * 2, BASE_DELAY * 3]);
}

#[tokio::test(start_paused = true)]
async fn test_zero_budget_gives_up_after_first_failure() {
    let h = start(MockProtocolClient::with_fallback(OpenScript::refused()), config(0));

    let outcome = h.run.await.unwrap();

    assert_eq!(outcome, RunOutcome::RetriesExhausted { attempts: 0 });
    assert_eq!(h.client.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_login_resets_attempt_count() {
    let client = MockProtocolClient::new();
    client.push(OpenScript::refused());
    client.push(OpenScript::refused());
    let mut h = start(client, config(5));

    let status = h.connected().await;
    assert_eq!(status.attempt_count, 0);
    assert_eq!(h.client.open_count(), 3);

    // A later disconnect starts counting from one again
    h.emit(2, ended("server closed"));
    let status = h.wait_for(|s| s.attempt_count == 1).await;
    assert_eq!(status.state, SessionState::Connecting);

    let status = h.connected().await;
    assert_eq!(status.attempt_count, 0);
    assert_eq!(h.client.open_count(), 4);
    let times = h.client.open_times();
    assert_eq!(times[3] - times[2], BASE_DELAY);

    h.shutdown.shutdown();
    assert_eq!(h.run.await.unwrap(), RunOutcome::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_login_timeout_counts_as_failure() {
    let client = MockProtocolClient::new();
    client.push(OpenScript::Hang);
    let mut h = start(client, config(5));

    h.connected().await;

    let times = h.client.open_times();
    assert_eq!(times[1] - times[0], Duration::from_secs(30) + BASE_DELAY);
    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_end_before_login_is_a_failed_attempt() {
    let client = MockProtocolClient::new();
    client.push(OpenScript::Accept);
    let mut h = start(client, config(5));

    h.client.wait_for_opens(1).await;
    settle().await;
    assert_eq!(h.status.borrow().state, SessionState::Connecting);

    h.emit(
        0,
        ProtocolEvent::Kicked {
            reason: "whitelist".to_string(),
            logged_in: false,
        },
    );
    h.connected().await;

    assert_eq!(h.client.open_count(), 2);
    assert!(h.client.session(0).unwrap().is_closed());
    h.shutdown.shutdown();
    h.run.await.unwrap();
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_only_transient_errors_reconnect_when_connected() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;

    h.emit(
        0,
        ProtocolEvent::Error(ProtocolFault::new(
            FaultKind::Other("EPIPE".to_string()),
            "broken pipe",
        )),
    );
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.status.borrow().state, SessionState::Connected);
    assert_eq!(h.client.open_count(), 1);

    h.emit(0, ProtocolEvent::Error(ProtocolFault::refused("ECONNREFUSED")));
    h.wait_for(|s| s.attempt_count == 1).await;
    h.connected().await;
    assert_eq!(h.client.open_count(), 2);

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

// ============================================================================
// Stale events
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_events_from_superseded_session_are_ignored() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;

    h.emit(0, ended("connection reset"));
    h.wait_for(|s| s.attempt_count == 1).await;
    let status = h.connected().await;
    let current = status.session;

    // Session 0 keeps talking after being replaced
    h.emit(0, ended("late end"));
    h.emit(0, ProtocolEvent::Error(ProtocolFault::refused("late error")));
    h.chat(0, "Steve", "!ping");
    h.emit(0, ProtocolEvent::Died);
    tokio::time::sleep(Duration::from_secs(60)).await;

    let status = *h.status.borrow();
    assert_eq!(status.state, SessionState::Connected);
    assert_eq!(status.attempt_count, 0);
    assert_eq!(status.session, current);
    assert_eq!(h.client.open_count(), 2);
    assert!(h.client.session(0).unwrap().chats().is_empty());
    assert!(h.client.session(1).unwrap().chats().is_empty());
    assert_eq!(h.client.session(1).unwrap().respawns(), 0);

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_backoff_cancels_reconnect() {
    let mut h = start(MockProtocolClient::with_fallback(OpenScript::refused()), config(5));
    let status = h.wait_for(|s| s.attempt_count == 1).await;
    assert_eq!(status.state, SessionState::Connecting);

    h.shutdown.shutdown();
    let outcome = h.run.await.unwrap();

    assert_eq!(outcome, RunOutcome::Shutdown);
    assert_eq!(outcome.exit_status(), 0);
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(h.client.open_count(), 1);
    assert_eq!(h.status.borrow().state, SessionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_connected_closes_session() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;

    h.shutdown.shutdown();
    h.shutdown.shutdown();
    assert_eq!(h.run.await.unwrap(), RunOutcome::Shutdown);

    let session = h.client.session(0).unwrap();
    assert_eq!(session.close_reason().as_deref(), Some("Bot shutting down"));
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert!(session.actions().is_empty());
    assert_eq!(h.client.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_pending_open() {
    let h = start(MockProtocolClient::with_fallback(OpenScript::Hang), config(5));
    h.client.wait_for_opens(1).await;

    h.shutdown.shutdown();
    assert_eq!(h.run.await.unwrap(), RunOutcome::Shutdown);
    assert_eq!(h.status.borrow().state, SessionState::Disconnected);
    assert_eq!(h.client.open_count(), 1);
}

// ============================================================================
// Scheduler wiring
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_runs_only_while_connected() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let first = h.client.session(0).unwrap();

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(first.actions().len(), 1);

    h.emit(0, ended("restart"));
    h.wait_for(|s| s.attempt_count == 1).await;
    h.connected().await;
    let second = h.client.session(1).unwrap();

    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(first.actions().len(), 1);
    assert!(!second.actions().is_empty());

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_chat_activity_postpones_anti_idle() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    tokio::time::sleep(Duration::from_secs(250)).await;
    h.chat(0, "Steve", "anyone around?");
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert!(session.actions().is_empty());

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

// ============================================================================
// Chat behaviour
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_commands_are_dispatched() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    h.chat(0, "Steve", "!foo");
    h.chat(0, "Steve", "!say hello world");
    settle().await;

    assert_eq!(
        session.chats(),
        vec![
            "Unknown command: foo. Type !help for available commands.".to_string(),
            "hello world".to_string(),
        ]
    );

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_own_messages_are_ignored() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    h.chat(0, "Keeper", "!say loop");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(session.chats().is_empty());
    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_mention_gets_delayed_reply() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    h.chat(0, "Steve", "is KEEPER online?");
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(session.chats().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let chats = session.chats();
    assert_eq!(chats.len(), 1);
    assert!(chats[0].contains("Steve"));

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_join_message_welcome_and_respawn() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    h.emit(0, ProtocolEvent::Spawned);
    h.emit(
        0,
        ProtocolEvent::PlayerJoined {
            username: PlayerName::new("Alex"),
        },
    );
    h.emit(
        0,
        ProtocolEvent::PlayerJoined {
            username: PlayerName::new("keeper"),
        },
    );
    h.emit(0, ProtocolEvent::Died);
    tokio::time::sleep(Duration::from_secs(4)).await;

    assert_eq!(
        session.chats(),
        vec![
            "Welcome Alex! 👋".to_string(),
            "Bot connected! Type !help for commands.".to_string(),
        ]
    );
    assert_eq!(session.respawns(), 1);

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_delayed_messages_dropped_after_teardown() {
    let mut h = start(MockProtocolClient::new(), config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    h.emit(0, ProtocolEvent::Spawned);
    settle().await;
    h.emit(0, ended("gone"));
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(session.chats().is_empty());
    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_events_before_open_returns_are_replayed() {
    let client = MockProtocolClient::new();
    client.push(OpenScript::AcceptWithEvents(vec![
        ProtocolEvent::Spawned,
        ProtocolEvent::ChatReceived {
            sender: "Steve".to_string(),
            text: "!say early bird".to_string(),
        },
        ProtocolEvent::Died,
    ]));
    let mut h = start(client, config(5));
    h.connected().await;
    let session = h.client.session(0).unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;

    assert_eq!(
        session.chats(),
        vec![
            "early bird".to_string(),
            "Bot connected! Type !help for commands.".to_string(),
        ]
    );
    assert_eq!(session.respawns(), 1);

    h.shutdown.shutdown();
    h.run.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_handler_panicking_on_call_keeps_session() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut registry = builtin_registry().unwrap();
    let eager: CommandHandler = Arc::new(|_ctx: CommandContext| -> CommandFuture {
        panic!("panicked while building the future")
    });
    registry
        .register(CommandSpec::new("boom", "Panics immediately", "boom", eager))
        .unwrap();
    let client = MockProtocolClient::new();
    let manager = SessionManager::new(client.clone(), config(5), Arc::new(registry));
    let mut status = manager.status();
    let shutdown = manager.shutdown_handle();
    let run = tokio::spawn(manager.run());
    status
        .wait_for(|s| s.state == SessionState::Connected)
        .await
        .unwrap();
    let session = client.session(0).unwrap();

    assert!(client.emit(
        0,
        ProtocolEvent::ChatReceived {
            sender: "Steve".to_string(),
            text: "!boom".to_string(),
        }
    ));
    settle().await;

    assert!(!run.is_finished());
    assert_eq!(status.borrow().state, SessionState::Connected);
    assert_eq!(session.chats(), vec!["Error executing command: boom".to_string()]);

    shutdown.shutdown();
    assert_eq!(run.await.unwrap(), RunOutcome::Shutdown);
}
