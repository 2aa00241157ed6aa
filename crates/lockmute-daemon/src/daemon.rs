//! Core daemon orchestration.

use lockmute_audio::AudioBackend;
use lockmute_bus::{SessionManager, SignalBus, Subscription};
use lockmute_types::{LockEvent, LockSource, SessionHandle};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::adapter::EventSourceAdapter;
use crate::config::Config;
use crate::controller::MuteController;
use crate::error::DaemonError;
use crate::locator::SessionLocator;

/// Events processed by the daemon's main loop.
#[derive(Debug)]
pub enum DaemonEvent {
    /// A normalized lock state change from any adapter.
    Lock(LockEvent),
    /// Shutdown signal.
    Shutdown,
}

/// Snapshot of daemon state, published after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonStatus {
    /// Session whose lock signals are followed, once resolved.
    pub session: Option<SessionHandle>,
    /// Sources with a live registration.
    pub sources: Vec<LockSource>,
    pub forced_mute: bool,
    pub was_muted_before_lock: bool,
    pub events_handled: u64,
}

/// Log line for a lock event; screensaver lines name the screensaver.
fn event_line(event: LockEvent, screensaver: Option<&str>) -> String {
    let text = event.source.describe(event.locked);
    match (event.source, screensaver) {
        (LockSource::ScreenSaver, Some(name)) => format!("{text} ({name})"),
        _ => text.to_string(),
    }
}

/// The lockmute daemon.
///
/// All lock events funnel into one queue, pushed synchronously by the bus
/// readers. The main loop finishes each controller transition before it takes
/// the next event, so transitions are applied strictly in arrival order.
pub struct Daemon {
    config: Config,
    uid: u32,
    manager: Box<dyn SessionManager>,
    bus: Box<dyn SignalBus>,
    controller: MuteController,
    subscriptions: Vec<Subscription>,
    /// Display name of the bound screensaver, for log lines.
    screensaver: Option<String>,
    event_tx: mpsc::UnboundedSender<DaemonEvent>,
    event_rx: mpsc::UnboundedReceiver<DaemonEvent>,
    status_tx: watch::Sender<DaemonStatus>,
}

impl Daemon {
    /// Create a new daemon instance for the user `uid`.
    pub fn new(
        config: Config,
        uid: u32,
        manager: Box<dyn SessionManager>,
        bus: Box<dyn SignalBus>,
        audio: Box<dyn AudioBackend>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(DaemonStatus::default());
        let controller = MuteController::new(audio, config.controller.relock);

        Self {
            config,
            uid,
            manager,
            bus,
            controller,
            subscriptions: Vec::new(),
            screensaver: None,
            event_tx,
            event_rx,
            status_tx,
        }
    }

    /// Get a clone of the event sender for feeding events into the daemon.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<DaemonEvent> {
        self.event_tx.clone()
    }

    /// Subscribe to status snapshots.
    pub fn status_receiver(&self) -> watch::Receiver<DaemonStatus> {
        self.status_tx.subscribe()
    }

    /// Resolve the session, register every adapter, then process events
    /// until [`DaemonEvent::Shutdown`].
    ///
    /// Returns an error only for startup failures.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        self.start().await?;
        info!("Monitoring started. Press Ctrl+C to stop.");

        loop {
            match self.event_rx.recv().await {
                Some(DaemonEvent::Lock(event)) => {
                    info!("{}", event_line(event, self.screensaver.as_deref()));
                    self.controller.handle(event).await;
                    let forced_mute = self.controller.is_forced_mute();
                    let was_muted = self.controller.was_muted_before_lock();
                    self.status_tx.send_modify(|status| {
                        status.forced_mute = forced_mute;
                        status.was_muted_before_lock = was_muted;
                        status.events_handled += 1;
                    });
                }
                Some(DaemonEvent::Shutdown) | None => {
                    info!("Stopping monitor...");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    async fn start(&mut self) -> Result<(), DaemonError> {
        let session = SessionLocator::new(self.config.session.strategy)
            .locate(self.manager.as_ref(), self.uid)
            .await?;
        self.status_tx
            .send_modify(|status| status.session = Some(session.clone()));

        self.register(EventSourceAdapter::session_lock(session)).await?;
        self.register(EventSourceAdapter::sleep_prepare()).await?;
        self.register_screensaver().await;
        Ok(())
    }

    async fn register(&mut self, adapter: EventSourceAdapter) -> Result<(), DaemonError> {
        let subscription = adapter
            .register(self.bus.as_mut(), self.event_tx.clone())
            .await?;
        debug!(subject = %subscription.subject(), "registered");
        self.subscriptions.push(subscription);
        let source = adapter.kind().source();
        self.status_tx.send_modify(|status| status.sources.push(source));
        Ok(())
    }

    /// Bind the first screensaver present. Absence is a normal condition.
    async fn register_screensaver(&mut self) {
        if !self.config.screensaver.enabled {
            info!("screensaver monitoring disabled");
            return;
        }

        // Reported against the first candidate, the preferred one.
        let mut first_failure = None;
        for target in self.config.screensaver.targets.clone() {
            let name = target.name.clone();
            match self.register(EventSourceAdapter::screensaver(target)).await {
                Ok(()) => {
                    info!("Connected to {name}");
                    self.screensaver = Some(name);
                    return;
                }
                Err(e) => {
                    debug!(screensaver = %name, error = %e, "screensaver not bound");
                    first_failure.get_or_insert((name, e));
                }
            }
        }

        match first_failure {
            Some((name, e)) => {
                info!("{name} not available (this is OK on non-GNOME desktops): {e}");
            }
            None => info!("no screensaver candidates configured"),
        }
    }

    fn shutdown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        info!("daemon shut down complete");
    }
}
