//! zbus backend for systemd-logind and desktop screensavers.

mod proxy;
mod routes;
mod sessions;
mod signals;

use tracing::debug;
use zbus::Connection;

use self::routes::Router;
use crate::error::BusError;

/// Connections to the system bus (logind) and the session bus (screensaver).
///
/// Each connection has one reader that routes signals to subscribers.
#[derive(Clone)]
pub struct LogindBus {
    system: Connection,
    session: Connection,
    system_routes: Router,
    session_routes: Router,
}

impl LogindBus {
    /// Connect to both buses. Either failing is fatal for the caller.
    pub async fn connect() -> Result<Self, BusError> {
        let system = Connection::system()
            .await
            .map_err(|e| BusError::Connection {
                bus: "system",
                reason: e.to_string(),
            })?;
        let session = Connection::session()
            .await
            .map_err(|e| BusError::Connection {
                bus: "session",
                reason: e.to_string(),
            })?;
        debug!("connected to system and session buses");
        let system_routes = Router::spawn(&system, "system");
        let session_routes = Router::spawn(&session, "session");
        Ok(Self {
            system,
            session,
            system_routes,
            session_routes,
        })
    }
}
