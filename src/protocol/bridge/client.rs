//! Bridge client and session handle

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{BotError, Result};
use crate::protocol::{ConnectParams, ProtocolClient, ProtocolSession};
use crate::session::EventSink;
use crate::types::{MinorAction, NavigationGoal, PlayerInfo, ProtocolFault, Vitals, WorldTime};

use super::cache::WorldCache;
use super::messages::Outbound;
use super::reader::{spawn_reader, spawn_writer};

/// Default bridge address
pub const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:25580";

/// Default time allowed for the bridge TCP connect
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum length of one bridge line (1MB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// [`ProtocolClient`] speaking newline-delimited JSON to a protocol bridge
#[derive(Debug, Clone)]
pub struct BridgeClient {
    addr: String,
    connect_timeout: Duration,
    max_line_length: usize,
}

impl BridgeClient {
    /// Create a client for the bridge listening at `addr` (`host:port`)
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Set the TCP connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum accepted line length
    #[must_use]
    pub const fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Bridge address this client connects to
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&self.addr)
            .await
            .map_err(|e| {
                BotError::connect(ProtocolFault::host_not_found(format!("{}: {e}", self.addr)))
            })?
            .collect();

        if addrs.is_empty() {
            return Err(BotError::connect(ProtocolFault::host_not_found(
                self.addr.clone(),
            )));
        }
        Ok(addrs)
    }

    async fn open_impl(
        &self,
        params: ConnectParams,
        events: EventSink,
    ) -> Result<Arc<dyn ProtocolSession>> {
        let addrs = self.resolve().await?;

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addrs[..]))
            .await
            .map_err(|_| BotError::timeout(format!("connecting to bridge at {}", self.addr)))?
            .map_err(|e| BotError::connect(ProtocolFault::from_io(&e)))?;
        stream.set_nodelay(true)?;

        log::debug!(
            "[{}] Bridge connected at {}, opening {}:{} as {}",
            events.session(),
            self.addr,
            params.host,
            params.port,
            params.username
        );

        let (read, write) = stream.into_split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        outbound
            .send(Outbound::open(&params))
            .map_err(|_| BotError::transport("bridge writer stopped before open"))?;

        let closed = CancellationToken::new();
        let cache = Arc::new(RwLock::new(WorldCache::default()));

        spawn_writer(write, outbound_rx);
        spawn_reader(
            read,
            Arc::clone(&cache),
            events,
            self.max_line_length,
            closed.clone(),
        );

        Ok(Arc::new(BridgeSession {
            requested_username: params.username,
            outbound,
            cache,
            closed,
        }))
    }
}

impl Default for BridgeClient {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_ADDR)
    }
}

impl ProtocolClient for BridgeClient {
    async fn open(&self, params: ConnectParams, events: EventSink) -> Result<Arc<dyn ProtocolSession>> {
        self.open_impl(params, events).await
    }
}

/// One session on the bridge
pub struct BridgeSession {
    requested_username: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    cache: Arc<RwLock<WorldCache>>,
    closed: CancellationToken,
}

impl BridgeSession {
    fn send(&self, message: Outbound) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(BotError::transport("bridge session is closed"));
        }
        self.outbound
            .send(message)
            .map_err(|_| BotError::transport("bridge writer stopped"))
    }

    fn require_navigation(&self) -> Result<()> {
        if self.cache.read().navigation {
            Ok(())
        } else {
            Err(BotError::NavigationUnavailable)
        }
    }
}

impl ProtocolSession for BridgeSession {
    fn username(&self) -> String {
        self.cache
            .read()
            .username
            .clone()
            .unwrap_or_else(|| self.requested_username.clone())
    }

    fn send_chat(&self, text: &str) -> Result<()> {
        self.send(Outbound::Chat {
            message: text.to_string(),
        })
    }

    fn perform_minor_action(&self, action: MinorAction) -> Result<()> {
        self.send(Outbound::Action { action })
    }

    fn vitals(&self) -> Result<Vitals> {
        self.cache
            .read()
            .vitals
            .ok_or_else(|| BotError::transport("bot has not spawned yet"))
    }

    fn world_time(&self) -> Result<WorldTime> {
        self.cache
            .read()
            .time
            .ok_or_else(|| BotError::transport("no world time received yet"))
    }

    fn online_players(&self) -> Result<Vec<PlayerInfo>> {
        Ok(self.cache.read().players.values().cloned().collect())
    }

    fn move_to(&self, goal: NavigationGoal) -> Result<()> {
        self.require_navigation()?;
        self.send(Outbound::Goal { goal: Some(goal) })
    }

    fn stop_moving(&self) -> Result<()> {
        self.require_navigation()?;
        self.send(Outbound::Goal { goal: None })
    }

    fn respawn(&self) -> Result<()> {
        self.send(Outbound::Respawn)
    }

    fn close(&self, reason: &str) {
        if self.closed.is_cancelled() {
            return;
        }
        // Stops the reader first so our own quit is not reported as an end
        self.closed.cancel();

        // Writer exits after flushing the quit request
        let _ = self.outbound.send(Outbound::Quit {
            reason: reason.to_string(),
        });
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        self.close("session dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AuthMode;
    use crate::session::events::ManagerEvent;
    use crate::types::{ProtocolEvent, SessionId};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn params() -> ConnectParams {
        ConnectParams {
            host: "mc.example.net".to_string(),
            port: 25565,
            username: "Keeper".to_string(),
            password: None,
            auth: AuthMode::Offline,
            version: None,
        }
    }

    async fn next_protocol_event(rx: &mut mpsc::UnboundedReceiver<ManagerEvent>) -> ProtocolEvent {
        match rx.recv().await {
            Some(ManagerEvent::Protocol { event, .. }) => event,
            other => panic!("unexpected manager event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_sends_request_and_forwards_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let bridge = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();

            let open = lines.next_line().await.unwrap().unwrap();
            write
                .write_all(
                    b"{\"event\":\"capabilities\",\"navigation\":true}\n\
                      {\"event\":\"login\",\"username\":\"Keeper\"}\n\
                      {\"event\":\"chat\",\"username\":\"Steve\",\"message\":\"hi\"}\n",
                )
                .await
                .unwrap();

            let chat = lines.next_line().await.unwrap().unwrap();
            (open, chat)
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(SessionId::new(), tx);
        let session = BridgeClient::new(addr.to_string())
            .open(params(), sink)
            .await
            .unwrap();

        assert_eq!(
            next_protocol_event(&mut rx).await,
            ProtocolEvent::LoginSuccess {
                username: "Keeper".to_string()
            }
        );
        assert_eq!(
            next_protocol_event(&mut rx).await,
            ProtocolEvent::ChatReceived {
                sender: "Steve".to_string(),
                text: "hi".to_string()
            }
        );

        session.send_chat("hello").unwrap();
        let (open, chat) = bridge.await.unwrap();
        assert!(open.contains(r#""type":"open""#));
        assert_eq!(chat, r#"{"type":"chat","message":"hello"}"#);

        session.close("test done");
        assert!(session.send_chat("late").is_err());
    }

    #[tokio::test]
    async fn socket_close_reports_session_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(SessionId::new(), tx);
        let _session = BridgeClient::new(addr.to_string())
            .open(params(), sink)
            .await
            .unwrap();

        loop {
            match next_protocol_event(&mut rx).await {
                ProtocolEvent::SessionEnded { .. } => break,
                ProtocolEvent::Error(_) => continue,
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn refused_connection_is_transient() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(SessionId::new(), tx);
        let err = BridgeClient::new(addr.to_string())
            .open(params(), sink)
            .await
            .err()
            .unwrap();
        assert!(err.is_transient(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn navigation_requires_capability() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _bridge = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(SessionId::new(), tx);
        let session = BridgeClient::new(addr.to_string())
            .open(params(), sink)
            .await
            .unwrap();

        assert!(matches!(
            session.stop_moving(),
            Err(BotError::NavigationUnavailable)
        ));
        session.close("test done");
    }
}
