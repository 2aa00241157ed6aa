//! [`SessionManager`] over `org.freedesktop.login1`.

use async_trait::async_trait;
use lockmute_types::{SessionHandle, SessionKind, SessionRecord};
use tracing::debug;

use super::proxy::{LoginManagerProxy, LoginSessionProxy};
use super::LogindBus;
use crate::error::BusError;
use crate::SessionManager;

impl LogindBus {
    pub(super) async fn manager(&self) -> Result<LoginManagerProxy<'static>, BusError> {
        LoginManagerProxy::new(&self.system)
            .await
            .map_err(|e| BusError::call("login1.Manager", e))
    }

    pub(super) async fn session_proxy(
        &self,
        path: &str,
    ) -> Result<LoginSessionProxy<'static>, BusError> {
        LoginSessionProxy::builder(&self.system)
            .path(path.to_string())
            .map_err(|e| BusError::call("login1.Session", e))?
            .build()
            .await
            .map_err(|e| BusError::call("login1.Session", e))
    }
}

#[async_trait]
impl SessionManager for LogindBus {
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, BusError> {
        let rows = self
            .manager()
            .await?
            .list_sessions()
            .await
            .map_err(|e| BusError::call("ListSessions", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, uid, user, seat, path)| SessionRecord {
                id,
                uid,
                user,
                seat,
                path: path.to_string(),
            })
            .collect())
    }

    async fn session_type(
        &self,
        session: &SessionRecord,
    ) -> Result<Option<SessionKind>, BusError> {
        let proxy = self.session_proxy(&session.path).await?;
        match proxy.kind().await {
            Ok(kind) => Ok(Some(SessionKind::parse(&kind))),
            Err(e) => {
                debug!(session = %session.id, error = %e, "session has no Type property");
                Ok(None)
            }
        }
    }

    async fn session_by_pid(&self, pid: u32) -> Result<SessionHandle, BusError> {
        let path = self
            .manager()
            .await?
            .get_session_by_pid(pid)
            .await
            .map_err(|e| BusError::call("GetSessionByPID", e))?
            .to_string();

        let id = self
            .session_proxy(&path)
            .await?
            .id()
            .await
            .map_err(|e| BusError::call("Session.Id", e))?;

        Ok(SessionHandle { id, path })
    }
}
