//! Session manager and signal bus abstractions for lockmute.
//!
//! The daemon needs three things from the system and session buses: list the
//! sessions known to the session manager, resolve a session by process id,
//! and subscribe to named signals on named objects. [`SessionManager`] and
//! [`SignalBus`] are those seams. The zbus backend talking to systemd-logind
//! lives behind the `linux` feature; `mock` provides a scriptable bus for
//! tests.

use std::sync::Arc;

use async_trait::async_trait;
use lockmute_types::{SessionHandle, SessionKind, SessionRecord};

pub mod error;
#[cfg(feature = "linux")]
pub mod linux;
#[cfg(feature = "mock")]
pub mod mock;

pub use error::BusError;

/// Raw signal shapes as they arrive from the bus, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSignal {
    /// Session `Lock`.
    Lock,
    /// Session `Unlock`.
    Unlock,
    /// Manager `PrepareForSleep(sleeping)`.
    PrepareForSleep(bool),
    /// Screensaver `ActiveChanged(active)`.
    ActiveChanged(bool),
}

/// Receives the raw signals of one subscription.
///
/// Called synchronously from the bus reader, once per signal, in the order the
/// signals were read off the connection.
pub type SignalSink = Arc<dyn Fn(BusSignal) + Send + Sync>;

/// A desktop screensaver object on the session bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSaverTarget {
    /// Human readable name used in log lines.
    pub name: String,
    pub service: String,
    pub path: String,
    pub interface: String,
}

impl ScreenSaverTarget {
    /// GNOME Shell's screensaver.
    pub fn gnome() -> Self {
        Self {
            name: "GNOME ScreenSaver".to_string(),
            service: "org.gnome.ScreenSaver".to_string(),
            path: "/org/gnome/ScreenSaver".to_string(),
            interface: "org.gnome.ScreenSaver".to_string(),
        }
    }

    /// The freedesktop screensaver implemented by KDE and others.
    pub fn freedesktop() -> Self {
        Self {
            name: "freedesktop ScreenSaver".to_string(),
            service: "org.freedesktop.ScreenSaver".to_string(),
            path: "/org/freedesktop/ScreenSaver".to_string(),
            interface: "org.freedesktop.ScreenSaver".to_string(),
        }
    }
}

/// Object whose signals a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSubject {
    /// `Lock` and `Unlock` on one session object.
    Session(SessionHandle),
    /// `PrepareForSleep` on the session manager.
    Manager,
    /// `ActiveChanged` on a screensaver object.
    ScreenSaver(ScreenSaverTarget),
}

impl std::fmt::Display for SignalSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(handle) => write!(f, "session {}", handle.id),
            Self::Manager => write!(f, "session manager"),
            Self::ScreenSaver(target) => write!(f, "{}", target.service),
        }
    }
}

/// A live signal registration.
///
/// Dropping the subscription, or calling [`Subscription::unsubscribe`], stops
/// delivery.
pub struct Subscription {
    subject: SignalSubject,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a registration; `cancel` detaches its sink.
    pub fn new(subject: SignalSubject, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            subject,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn subject(&self) -> &SignalSubject {
        &self.subject
    }

    /// Stop delivering signals for this registration.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subject", &self.subject)
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

/// Read access to the session manager.
#[async_trait]
pub trait SessionManager: Send + Sync + 'static {
    /// List every session known to the manager.
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, BusError>;

    /// Read the `Type` attribute of a session, `None` if it has none.
    async fn session_type(&self, session: &SessionRecord)
        -> Result<Option<SessionKind>, BusError>;

    /// Resolve the session a process belongs to. Pid 0 means the caller.
    async fn session_by_pid(&self, pid: u32) -> Result<SessionHandle, BusError>;
}

/// Signal subscription on bus objects.
#[async_trait]
pub trait SignalBus: Send + 'static {
    /// Register for the signals of `subject`, handing each one to `sink`.
    ///
    /// Fails with [`BusError::Unavailable`] when the object is not present.
    async fn subscribe(
        &mut self,
        subject: &SignalSubject,
        sink: SignalSink,
    ) -> Result<Subscription, BusError>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn subject_display() {
        let handle = SessionHandle {
            id: "3".into(),
            path: "/org/freedesktop/login1/session/_33".into(),
        };
        assert_eq!(SignalSubject::Session(handle).to_string(), "session 3");
        assert_eq!(
            SignalSubject::ScreenSaver(ScreenSaverTarget::gnome()).to_string(),
            "org.gnome.ScreenSaver"
        );
    }

    #[test]
    fn unsubscribe_runs_cancel_once() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cancelled);
        let subscription = Subscription::new(SignalSubject::Manager, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_cancels() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cancelled);
        {
            let _subscription = Subscription::new(SignalSubject::Manager, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }
}
