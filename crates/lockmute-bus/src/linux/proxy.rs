//! logind proxies.

use zbus::proxy;
use zbus::zvariant::OwnedObjectPath;

/// One row of `ListSessions`: id, uid, user name, seat, object path.
pub(crate) type SessionRow = (String, u32, String, String, OwnedObjectPath);

#[proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1",
    gen_blocking = false
)]
pub(crate) trait LoginManager {
    fn list_sessions(&self) -> zbus::Result<Vec<SessionRow>>;

    #[zbus(name = "GetSessionByPID")]
    fn get_session_by_pid(&self, pid: u32) -> zbus::Result<OwnedObjectPath>;
}

#[proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1",
    gen_blocking = false
)]
pub(crate) trait LoginSession {
    #[zbus(property)]
    fn id(&self) -> zbus::Result<String>;

    #[zbus(property, name = "Type")]
    fn kind(&self) -> zbus::Result<String>;
}
