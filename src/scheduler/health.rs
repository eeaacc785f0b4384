//! Periodic health report
//!
//! Goes to the log only, never to chat.

use crate::session::SessionLink;

/// Point-in-time status of the bot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HealthReport {
    /// Whether the session behind the link is still live
    pub connected: bool,
    /// Logged-in username
    pub username: Option<String>,
    /// Health points
    pub health: Option<f32>,
    /// Food points
    pub food: Option<u32>,
    /// Number of players online, including the bot
    pub players_online: Option<usize>,
}

impl HealthReport {
    /// Gather a report through `link`
    ///
    /// Fields the session cannot answer are left empty.
    #[must_use]
    pub fn collect(link: &SessionLink) -> Self {
        let vitals = link.vitals().ok();
        Self {
            connected: !link.is_revoked(),
            username: link.username().ok(),
            health: vitals.map(|v| v.health),
            food: vitals.map(|v| v.food),
            players_online: link.online_players().ok().map(|players| players.len()),
        }
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| "?".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "connected={} username={} health={} food={} players={}",
            self.connected,
            self.username.as_deref().unwrap_or("?"),
            or_unknown(self.health),
            or_unknown(self.food),
            or_unknown(self.players_online),
        )
    }
}

/// Collect and log one health report
pub fn health_tick(link: &SessionLink) -> HealthReport {
    let report = HealthReport::collect(link);
    log::info!("Health report: {report}");
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::testing::MockSession;
    use crate::types::{SessionId, Vitals};

    #[test]
    fn report_reflects_session() {
        let session = Arc::new(MockSession::new("Keeper"));
        session.set_vitals(Vitals {
            health: 14.0,
            food: 9,
            ..Vitals::default()
        });
        session.add_player("Steve", None);
        let link = SessionLink::new(SessionId::new(), session, CancellationToken::new());

        let report = HealthReport::collect(&link);

        assert!(report.connected);
        assert_eq!(report.username.as_deref(), Some("Keeper"));
        assert_eq!(report.health, Some(14.0));
        assert_eq!(report.food, Some(9));
        assert_eq!(report.players_online, Some(1));
        assert_eq!(
            report.to_string(),
            "connected=true username=Keeper health=14 food=9 players=1"
        );
    }

    #[test]
    fn revoked_link_reports_disconnected() {
        let lifetime = CancellationToken::new();
        let link = SessionLink::new(
            SessionId::new(),
            Arc::new(MockSession::new("Keeper")),
            lifetime.clone(),
        );
        lifetime.cancel();

        let report = health_tick(&link);

        assert_eq!(report, HealthReport::default());
        assert_eq!(
            report.to_string(),
            "connected=false username=? health=? food=? players=?"
        );
    }
}
