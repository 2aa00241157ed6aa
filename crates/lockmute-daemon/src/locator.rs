//! Session lookup for the invoking user.

use lockmute_bus::SessionManager;
use lockmute_types::{SessionHandle, SessionRecord};
use tracing::{info, warn};

use crate::config::SessionStrategy;
use crate::error::DaemonError;

/// Pid that makes the session manager resolve the caller's own session.
const CALLER_PID: u32 = 0;

/// Finds the session whose lock signals the daemon follows.
#[derive(Debug, Clone, Copy)]
pub struct SessionLocator {
    strategy: SessionStrategy,
}

impl SessionLocator {
    pub fn new(strategy: SessionStrategy) -> Self {
        Self { strategy }
    }

    /// Resolve the session for `uid` according to the configured strategy.
    pub async fn locate(
        &self,
        manager: &dyn SessionManager,
        uid: u32,
    ) -> Result<SessionHandle, DaemonError> {
        match self.strategy {
            SessionStrategy::Enumerate => find_session_for_user(manager, uid).await,
            SessionStrategy::Caller => caller_session(manager).await,
            SessionStrategy::Auto => match find_session_for_user(manager, uid).await {
                Err(DaemonError::Bus(e)) => {
                    warn!(
                        error = %e,
                        "session listing unavailable, asking for the caller's session"
                    );
                    caller_session(manager).await
                }
                other => other,
            },
        }
    }
}

/// Enumerate sessions and pick the user's graphical one.
///
/// Preference, first match wins:
/// 1. a session of `uid` whose type is a display-server type, or which has no
///    type but sits on a seat;
/// 2. the first session of `uid` at all.
pub async fn find_session_for_user(
    manager: &dyn SessionManager,
    uid: u32,
) -> Result<SessionHandle, DaemonError> {
    let sessions = manager.list_sessions().await?;
    let owned: Vec<&SessionRecord> = sessions.iter().filter(|s| s.uid == uid).collect();

    for session in &owned {
        // An unreadable type counts as absent.
        let kind = manager.session_type(session).await.ok().flatten();
        match kind {
            Some(kind) if kind.is_graphical() => {
                info!("Found session: {} (type: {kind})", session.id);
                return Ok(session.handle());
            }
            None if session.has_seat() => {
                info!("Found session: {}", session.id);
                return Ok(session.handle());
            }
            _ => {}
        }
    }

    if let Some(session) = owned.first() {
        info!("Using session: {}", session.id);
        return Ok(session.handle());
    }

    Err(DaemonError::NoSessionFound { uid })
}

/// Ask the manager directly for the caller's session.
pub async fn caller_session(manager: &dyn SessionManager) -> Result<SessionHandle, DaemonError> {
    let handle = manager.session_by_pid(CALLER_PID).await?;
    info!("Using session: {}", handle.id);
    Ok(handle)
}
