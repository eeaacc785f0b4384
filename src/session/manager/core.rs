//! Core session manager structure and run loop

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::commands::{CommandDispatcher, CommandRegistry};
use crate::protocol::{ConnectParams, ProtocolClient};
use crate::random::SharedRng;
use crate::scheduler::{ActivityClock, IdleScheduler, SchedulerConfig};

use super::super::events::ManagerEvent;
use super::super::record::Session;
use super::super::retry::RetryPolicy;
use super::super::state::{SessionState, SessionStatus};
use super::chatter::ChatterConfig;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default time allowed between opening a session and logging in
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default command prefix
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

// ============================================================================
// CONFIGURATION AND OUTCOMES
// ============================================================================

/// Everything the manager needs besides the protocol client and commands
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Connection parameters reused for every attempt
    pub connect: ConnectParams,
    /// Reconnect budget and backoff
    pub retry: RetryPolicy,
    /// Attempts that do not log in within this window count as failed
    pub login_timeout: Duration,
    /// Idle scheduler timings
    pub scheduler: SchedulerConfig,
    /// Chat command prefix
    pub command_prefix: String,
    /// Join message and welcome behaviour
    pub chatter: ChatterConfig,
    /// Seed for reproducible random choices
    pub rng_seed: Option<u64>,
}

impl ManagerConfig {
    /// Defaults for everything but the connection parameters
    #[must_use]
    pub fn new(connect: ConnectParams) -> Self {
        Self {
            connect,
            retry: RetryPolicy::default(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            scheduler: SchedulerConfig::default(),
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            chatter: ChatterConfig::default(),
            rng_seed: None,
        }
    }
}

/// Why [`SessionManager::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Explicit shutdown
    Shutdown,
    /// The retry budget ran out
    RetriesExhausted {
        /// Reconnect attempts made before giving up
        attempts: u32,
    },
}

impl RunOutcome {
    /// Process exit status: 0 for shutdown, 1 for exhaustion
    #[must_use]
    pub const fn exit_status(self) -> u8 {
        match self {
            Self::Shutdown => 0,
            Self::RetriesExhausted { .. } => 1,
        }
    }
}

impl From<RunOutcome> for ExitCode {
    fn from(outcome: RunOutcome) -> Self {
        Self::from(outcome.exit_status())
    }
}

/// Cloneable trigger for an explicit shutdown
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Request shutdown. Safe to call from any state, any number of times.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ============================================================================
// SESSION MANAGER CORE
// ============================================================================

/// Owner of the connection state machine
///
/// The manager runs on one task. Protocol events, open results, login
/// timeouts and reconnect timers all arrive through one queue, so every
/// state change happens in [`SessionManager::run`] without locking.
/// Components that act on the session get a [`super::super::SessionLink`]
/// that stops working once the session it was issued for is torn down.
pub struct SessionManager<C: ProtocolClient> {
    pub(super) client: Arc<C>,
    pub(super) params: ConnectParams,
    pub(super) policy: RetryPolicy,
    pub(super) login_timeout: Duration,
    pub(super) chatter: ChatterConfig,
    pub(super) rng: SharedRng,
    pub(super) scheduler: IdleScheduler,
    pub(super) dispatcher: CommandDispatcher,
    pub(super) events_tx: mpsc::UnboundedSender<ManagerEvent>,
    events_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    pub(super) state: SessionState,
    pub(super) attempt_count: u32,
    pub(super) session: Option<Session>,
    pub(super) reconnect: Option<PendingReconnect>,
    pub(super) next_ticket: u64,
    pub(super) shutdown: CancellationToken,
    status_tx: watch::Sender<SessionStatus>,
}

/// A scheduled re-entry into `connecting`
pub(super) struct PendingReconnect {
    pub ticket: u64,
    pub cancel: CancellationToken,
}

impl<C: ProtocolClient> SessionManager<C> {
    /// Create a manager in the `disconnected` state
    #[must_use]
    pub fn new(client: C, config: ManagerConfig, registry: Arc<CommandRegistry>) -> Self {
        let rng = SharedRng::from_seed(config.rng_seed);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SessionStatus::default());

        Self {
            client: Arc::new(client),
            params: config.connect,
            policy: config.retry,
            login_timeout: config.login_timeout,
            chatter: config.chatter,
            scheduler: IdleScheduler::new(config.scheduler, ActivityClock::new(), rng.clone()),
            dispatcher: CommandDispatcher::new(registry, config.command_prefix, rng.clone()),
            rng,
            events_tx,
            events_rx,
            state: SessionState::Disconnected,
            attempt_count: 0,
            session: None,
            reconnect: None,
            next_ticket: 0,
            shutdown: CancellationToken::new(),
            status_tx,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Reconnect attempts in the current failure chain
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Retry policy in use
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Subscribe to status snapshots
    #[must_use]
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Handle for requesting shutdown while [`Self::run`] is in progress
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            token: self.shutdown.clone(),
        }
    }

    /// Connect and keep the session alive until shutdown or exhaustion
    pub async fn run(mut self) -> RunOutcome {
        log::info!(
            "Session manager starting (max attempts {}, base delay {}ms)",
            self.policy.max_attempts,
            self.policy.base_delay.as_millis()
        );
        self.begin_connect();

        loop {
            let next = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => None,
                event = self.events_rx.recv() => event,
            };
            // The manager holds a sender, so `None` here means shutdown
            let Some(event) = next else {
                return self.shutdown_now();
            };
            if let Some(outcome) = self.handle_event(event) {
                return outcome;
            }
        }
    }

    /// Move to `state` and publish a status snapshot
    pub(super) fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::debug!("Session state {} -> {}", self.state, state);
        }
        self.state = state;
        self.publish();
    }

    pub(super) fn publish(&self) {
        self.status_tx.send_replace(SessionStatus {
            state: self.state,
            attempt_count: self.attempt_count,
            session: self.session.as_ref().map(|s| s.id),
        });
    }
}

impl<C: ProtocolClient> std::fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("attempt_count", &self.attempt_count)
            .field("session", &self.session)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
