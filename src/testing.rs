//! Test doubles for the protocol capability
//!
//! [`MockProtocolClient`] plays scripted open outcomes and keeps every
//! [`EventSink`] it was handed so tests can inject protocol events.
//! [`MockSession`] records outbound traffic and serves settable world state.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{BotError, Result};
use crate::protocol::{ConnectParams, EventSink, ProtocolClient, ProtocolSession};
use crate::types::{
    MinorAction, NavigationGoal, PlayerInfo, PlayerName, Position, ProtocolEvent, ProtocolFault,
    Vitals, WorldTime,
};

// ============================================================================
// MOCK SESSION
// ============================================================================

#[derive(Default)]
struct SessionState {
    chats: Vec<String>,
    actions: Vec<MinorAction>,
    goals: Vec<Option<NavigationGoal>>,
    respawns: usize,
    vitals: Option<Vitals>,
    time: Option<WorldTime>,
    players: Vec<PlayerInfo>,
    navigation: bool,
    fail_actions: bool,
    closed: Option<String>,
}

/// Recording [`ProtocolSession`]
pub struct MockSession {
    username: String,
    state: Mutex<SessionState>,
}

impl MockSession {
    /// A spawned session with default vitals, navigation support and nobody
    /// else online
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            state: Mutex::new(SessionState {
                vitals: Some(Vitals::default()),
                time: Some(WorldTime::default()),
                navigation: true,
                ..SessionState::default()
            }),
        }
    }

    /// Chat lines sent so far
    #[must_use]
    pub fn chats(&self) -> Vec<String> {
        self.state.lock().chats.clone()
    }

    /// Anti-idle actions performed so far
    #[must_use]
    pub fn actions(&self) -> Vec<MinorAction> {
        self.state.lock().actions.clone()
    }

    /// Navigation goals set so far; `None` entries are stops
    #[must_use]
    pub fn goals(&self) -> Vec<Option<NavigationGoal>> {
        self.state.lock().goals.clone()
    }

    /// Number of respawn requests
    #[must_use]
    pub fn respawns(&self) -> usize {
        self.state.lock().respawns
    }

    /// Replace the reported vitals
    pub fn set_vitals(&self, vitals: Vitals) {
        self.state.lock().vitals = Some(vitals);
    }

    /// Replace the reported world time
    pub fn set_world_time(&self, time: WorldTime) {
        self.state.lock().time = Some(time);
    }

    /// Add an online player
    pub fn add_player(&self, name: &str, position: Option<Position>) {
        self.state.lock().players.push(PlayerInfo {
            name: PlayerName::new(name),
            position,
        });
    }

    /// Toggle navigation support
    pub fn set_navigation(&self, available: bool) {
        self.state.lock().navigation = available;
    }

    /// Make every anti-idle action fail
    pub fn set_fail_actions(&self, fail: bool) {
        self.state.lock().fail_actions = fail;
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed.is_some()
    }

    /// Reason given to the first `close` call
    #[must_use]
    pub fn close_reason(&self) -> Option<String> {
        self.state.lock().closed.clone()
    }

    fn ensure_open(state: &SessionState) -> Result<()> {
        if state.closed.is_some() {
            Err(BotError::transport("session closed"))
        } else {
            Ok(())
        }
    }
}

impl ProtocolSession for MockSession {
    fn username(&self) -> String {
        self.username.clone()
    }

    fn send_chat(&self, text: &str) -> Result<()> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        state.chats.push(text.to_string());
        Ok(())
    }

    fn perform_minor_action(&self, action: MinorAction) -> Result<()> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        if state.fail_actions {
            return Err(BotError::transport(format!("{action} rejected")));
        }
        state.actions.push(action);
        Ok(())
    }

    fn vitals(&self) -> Result<Vitals> {
        self.state
            .lock()
            .vitals
            .ok_or_else(|| BotError::transport("not spawned"))
    }

    fn world_time(&self) -> Result<WorldTime> {
        self.state
            .lock()
            .time
            .ok_or_else(|| BotError::transport("no time update"))
    }

    fn online_players(&self) -> Result<Vec<PlayerInfo>> {
        Ok(self.state.lock().players.clone())
    }

    fn move_to(&self, goal: NavigationGoal) -> Result<()> {
        let mut state = self.state.lock();
        if !state.navigation {
            return Err(BotError::NavigationUnavailable);
        }
        state.goals.push(Some(goal));
        Ok(())
    }

    fn stop_moving(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.navigation {
            return Err(BotError::NavigationUnavailable);
        }
        state.goals.push(None);
        Ok(())
    }

    fn respawn(&self) -> Result<()> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        state.respawns += 1;
        Ok(())
    }

    fn close(&self, reason: &str) {
        let mut state = self.state.lock();
        if state.closed.is_none() {
            state.closed = Some(reason.to_string());
        }
    }
}

// ============================================================================
// MOCK CLIENT
// ============================================================================

/// Scripted outcome of one `open` call
#[derive(Debug, Clone, PartialEq)]
pub enum OpenScript {
    /// Return a session; login must be injected by the test
    Accept,
    /// Return a session and report `LoginSuccess` straight away
    AcceptAndLogin,
    /// Report `LoginSuccess` followed by these events, then return a session
    AcceptWithEvents(Vec<ProtocolEvent>),
    /// Fail with the given protocol fault
    Reject(ProtocolFault),
    /// Never resolve
    Hang,
}

impl OpenScript {
    /// Fail with a connection-refused fault
    #[must_use]
    pub fn refused() -> Self {
        Self::Reject(ProtocolFault::refused("connect ECONNREFUSED"))
    }
}

/// One recorded `open` call
#[derive(Clone)]
pub struct OpenRecord {
    /// Parameters the manager passed
    pub params: ConnectParams,
    /// Sink for injecting events into this attempt
    pub sink: EventSink,
    /// Session handed back, if the attempt was accepted
    pub session: Option<Arc<MockSession>>,
    /// When the call was made
    pub opened_at: Instant,
}

struct ClientState {
    script: VecDeque<OpenScript>,
    fallback: OpenScript,
    opens: Vec<OpenRecord>,
}

struct ClientInner {
    state: Mutex<ClientState>,
    opened: Notify,
}

/// Scripted [`ProtocolClient`]
///
/// Each `open` consumes the next queued [`OpenScript`], or the fallback
/// once the queue is empty. Cloning yields a handle onto the same client.
#[derive(Clone)]
pub struct MockProtocolClient {
    inner: Arc<ClientInner>,
}

impl MockProtocolClient {
    /// Client whose fallback is [`OpenScript::AcceptAndLogin`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(OpenScript::AcceptAndLogin)
    }

    /// Client with a specific fallback outcome
    #[must_use]
    pub fn with_fallback(fallback: OpenScript) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                state: Mutex::new(ClientState {
                    script: VecDeque::new(),
                    fallback,
                    opens: Vec::new(),
                }),
                opened: Notify::new(),
            }),
        }
    }

    /// Queue the outcome of a future `open`
    pub fn push(&self, outcome: OpenScript) {
        self.inner.state.lock().script.push_back(outcome);
    }

    /// Number of `open` calls so far
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.inner.state.lock().opens.len()
    }

    /// Record of the `index`-th `open` call
    #[must_use]
    pub fn open_record(&self, index: usize) -> Option<OpenRecord> {
        self.inner.state.lock().opens.get(index).cloned()
    }

    /// Session returned by the `index`-th `open`, if accepted
    #[must_use]
    pub fn session(&self, index: usize) -> Option<Arc<MockSession>> {
        self.open_record(index).and_then(|record| record.session)
    }

    /// Inject an event as if the `index`-th session had reported it
    ///
    /// Returns `false` if there is no such attempt or the manager stopped.
    pub fn emit(&self, index: usize, event: ProtocolEvent) -> bool {
        self.open_record(index)
            .is_some_and(|record| record.sink.emit(event))
    }

    /// Instants of every `open` call so far
    #[must_use]
    pub fn open_times(&self) -> Vec<Instant> {
        self.inner
            .state
            .lock()
            .opens
            .iter()
            .map(|record| record.opened_at)
            .collect()
    }

    /// Wait until at least `count` `open` calls have happened
    pub async fn wait_for_opens(&self, count: usize) {
        loop {
            let opened = self.inner.opened.notified();
            if self.open_count() >= count {
                return;
            }
            opened.await;
        }
    }

    async fn open_impl(
        &self,
        params: ConnectParams,
        events: EventSink,
    ) -> Result<Arc<dyn ProtocolSession>> {
        let outcome = {
            let mut state = self.inner.state.lock();
            let outcome = state
                .script
                .pop_front()
                .unwrap_or_else(|| state.fallback.clone());
            let session = matches!(
                outcome,
                OpenScript::Accept | OpenScript::AcceptAndLogin | OpenScript::AcceptWithEvents(_)
            )
            .then(|| Arc::new(MockSession::new(params.username.clone())));
            state.opens.push(OpenRecord {
                params: params.clone(),
                sink: events.clone(),
                session: session.clone(),
                opened_at: Instant::now(),
            });
            self.inner.opened.notify_waiters();
            (outcome, session)
        };

        match outcome {
            (OpenScript::Reject(fault), _) => Err(BotError::connect(fault)),
            (OpenScript::Hang, _) => std::future::pending().await,
            (script, Some(session)) => {
                let early = match script {
                    OpenScript::AcceptAndLogin => Some(Vec::new()),
                    OpenScript::AcceptWithEvents(early) => Some(early),
                    _ => None,
                };
                if let Some(early) = early {
                    events.emit(ProtocolEvent::LoginSuccess {
                        username: params.username,
                    });
                    for event in early {
                        events.emit(event);
                    }
                }
                Ok(session)
            }
            (_, None) => Err(BotError::transport("mock session missing")),
        }
    }
}

impl Default for MockProtocolClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolClient for MockProtocolClient {
    async fn open(
        &self,
        params: ConnectParams,
        events: EventSink,
    ) -> Result<Arc<dyn ProtocolSession>> {
        self.open_impl(params, events).await
    }
}
