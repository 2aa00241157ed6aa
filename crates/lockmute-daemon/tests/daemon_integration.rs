//! Integration tests exercising the full daemon event loop on mock backends.

use std::time::Duration;

use lockmute_audio::mock::{AudioCall, MockAudio, MockAudioHandle};
use lockmute_bus::mock::{MockBus, MockBusHandle};
use lockmute_bus::{BusSignal, SignalSubject};
use lockmute_daemon::config::{Config, RelockPolicy, SessionStrategy};
use lockmute_daemon::{Daemon, DaemonError, DaemonEvent, DaemonStatus};
use lockmute_types::{LockSource, SessionKind, SessionRecord};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

const UID: u32 = 1000;

/// Everything needed to drive one running daemon.
struct TestDaemon {
    bus: MockBusHandle,
    audio: MockAudioHandle,
    status: watch::Receiver<DaemonStatus>,
    events: mpsc::UnboundedSender<DaemonEvent>,
    handle: tokio::task::JoinHandle<Result<(), DaemonError>>,
}

impl TestDaemon {
    async fn shutdown(self) -> Result<(), DaemonError> {
        let _ = self.events.send(DaemonEvent::Shutdown);
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("daemon should stop")
            .expect("daemon task should not panic")
    }

    /// Emit a signal and wait until the daemon has handled it.
    async fn deliver(&mut self, signal: BusSignal) {
        let before = self.status.borrow().events_handled;
        let delivered = self.bus.emit(signal);
        assert_eq!(delivered, 1, "exactly one adapter should receive {signal:?}");
        wait_for_status(&mut self.status, Duration::from_secs(5), |s| {
            s.events_handled > before
        })
        .await
        .expect("event should be handled");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn graphical_session(uid: u32) -> SessionRecord {
    SessionRecord {
        id: "2".to_string(),
        uid,
        user: "alice".to_string(),
        seat: "seat0".to_string(),
        path: "/org/freedesktop/login1/session/_32".to_string(),
    }
}

fn daemon_with(config: Config, bus: &MockBus, audio: MockAudio) -> Daemon {
    Daemon::new(
        config,
        UID,
        Box::new(bus.clone()),
        Box::new(bus.clone()),
        Box::new(audio),
    )
}

/// Start a daemon for a user with one graphical session.
///
/// `screensaver` puts that service on the bus before startup.
async fn start(muted: bool, screensaver: Option<&str>, config: Config) -> TestDaemon {
    init_tracing();

    let bus = MockBus::new();
    let bus_handle = bus.handle();
    bus_handle.add_session(graphical_session(UID), Some(SessionKind::Wayland));
    if let Some(service) = screensaver {
        bus_handle.add_screensaver(service);
    }

    let audio = MockAudio::new(muted);
    let audio_handle = audio.handle();

    let mut daemon = daemon_with(config, &bus, audio);
    let mut status = daemon.status_receiver();
    let events = daemon.event_sender();
    let handle = tokio::spawn(async move { daemon.run().await });

    let expected = if screensaver.is_some() { 3 } else { 2 };
    wait_for_status(&mut status, Duration::from_secs(5), |s| {
        s.sources.len() >= expected
    })
    .await
    .expect("adapters should register");

    TestDaemon {
        bus: bus_handle,
        audio: audio_handle,
        status,
        events,
        handle,
    }
}

/// Wait for a condition on a status receiver with timeout.
async fn wait_for_status(
    rx: &mut watch::Receiver<DaemonStatus>,
    timeout: Duration,
    pred: impl Fn(&DaemonStatus) -> bool,
) -> Result<DaemonStatus, &'static str> {
    tokio::time::timeout(timeout, async {
        loop {
            {
                let status = rx.borrow_and_update().clone();
                if pred(&status) {
                    return Ok(status);
                }
            }
            if rx.changed().await.is_err() {
                return Err("watch closed");
            }
        }
    })
    .await
    .map_err(|_| "timeout")?
}

#[tokio::test]
async fn test_lock_unlock_restores_sound() {
    let mut d = start(false, None, Config::default()).await;

    d.deliver(BusSignal::Lock).await;
    assert_eq!(d.audio.set_calls(), vec![true]);
    assert!(!d.status.borrow().was_muted_before_lock);
    assert!(d.status.borrow().forced_mute);

    d.deliver(BusSignal::Unlock).await;
    assert_eq!(d.audio.set_calls(), vec![true, false]);
    assert!(!d.audio.is_muted());

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_user_mute_survives_lock_cycle() {
    let mut d = start(true, None, Config::default()).await;

    d.deliver(BusSignal::Lock).await;
    assert_eq!(d.audio.set_calls(), vec![true]);
    assert!(d.status.borrow().was_muted_before_lock);

    d.audio.clear_calls();
    d.deliver(BusSignal::Unlock).await;
    assert!(d.audio.set_calls().is_empty());
    assert!(d.audio.is_muted());

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sleep_resume_matches_lock_unlock() {
    let mut d = start(false, None, Config::default()).await;

    d.deliver(BusSignal::PrepareForSleep(true)).await;
    assert_eq!(d.audio.set_calls(), vec![true]);
    assert!(!d.status.borrow().was_muted_before_lock);

    d.deliver(BusSignal::PrepareForSleep(false)).await;
    assert_eq!(d.audio.set_calls(), vec![true, false]);

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sources_produce_identical_backend_calls() {
    let mut traces = Vec::new();
    for (lock, unlock) in [
        (BusSignal::Lock, BusSignal::Unlock),
        (BusSignal::PrepareForSleep(true), BusSignal::PrepareForSleep(false)),
        (BusSignal::ActiveChanged(true), BusSignal::ActiveChanged(false)),
    ] {
        let mut d = start(false, Some("org.gnome.ScreenSaver"), Config::default()).await;
        d.deliver(lock).await;
        d.deliver(unlock).await;
        traces.push(d.audio.calls());
        d.shutdown().await.unwrap();
    }
    assert_eq!(
        traces[0],
        vec![
            AudioCall::GetMuted,
            AudioCall::SetMuted(true),
            AudioCall::SetMuted(false)
        ]
    );
    assert_eq!(traces[0], traces[1]);
    assert_eq!(traces[1], traces[2]);
}

#[tokio::test]
async fn test_missing_screensaver_degrades() {
    let mut d = start(false, None, Config::default()).await;

    let status = d.status.borrow().clone();
    assert_eq!(status.sources, vec![LockSource::Session, LockSource::Sleep]);
    assert!(!d
        .bus
        .subscriptions()
        .iter()
        .any(|s| matches!(s, SignalSubject::ScreenSaver(_))));

    d.deliver(BusSignal::Lock).await;
    assert_eq!(d.audio.set_calls(), vec![true]);

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_freedesktop_screensaver_fallback() {
    let mut d = start(false, Some("org.freedesktop.ScreenSaver"), Config::default()).await;

    let bound: Vec<String> = d
        .bus
        .subscriptions()
        .into_iter()
        .filter_map(|s| match s {
            SignalSubject::ScreenSaver(target) => Some(target.service),
            _ => None,
        })
        .collect();
    assert_eq!(bound, vec!["org.freedesktop.ScreenSaver".to_string()]);

    d.deliver(BusSignal::ActiveChanged(true)).await;
    assert_eq!(d.audio.set_calls(), vec![true]);

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disabled_screensaver_is_not_bound() {
    let mut config = Config::default();
    config.screensaver.enabled = false;
    let d = start(false, None, config).await;

    assert_eq!(d.bus.subscriptions().len(), 2);
    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_repeated_lock_recaptures_by_default() {
    let mut d = start(false, Some("org.gnome.ScreenSaver"), Config::default()).await;

    d.deliver(BusSignal::Lock).await;
    d.deliver(BusSignal::ActiveChanged(true)).await;
    assert_eq!(d.audio.set_calls(), vec![true, true]);
    // The second query saw the daemon's own mute.
    assert!(d.status.borrow().was_muted_before_lock);

    d.deliver(BusSignal::Unlock).await;
    assert_eq!(d.audio.set_calls(), vec![true, true]);

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_repeated_lock_keep_first_policy() {
    let mut config = Config::default();
    config.controller.relock = RelockPolicy::KeepFirst;
    let mut d = start(false, Some("org.gnome.ScreenSaver"), config).await;

    d.deliver(BusSignal::Lock).await;
    d.deliver(BusSignal::ActiveChanged(true)).await;
    assert!(!d.status.borrow().was_muted_before_lock);

    d.deliver(BusSignal::ActiveChanged(false)).await;
    assert_eq!(d.audio.set_calls(), vec![true, true, false]);

    d.shutdown().await.unwrap();
}

/// Emit signals back to back and wait until all of them are handled.
async fn burst(d: &mut TestDaemon, signals: &[BusSignal]) {
    let before = d.status.borrow().events_handled;
    for signal in signals {
        assert_eq!(d.bus.emit(*signal), 1, "one adapter should receive {signal:?}");
    }
    let expected = before + signals.len() as u64;
    wait_for_status(&mut d.status, Duration::from_secs(5), |s| {
        s.events_handled >= expected
    })
    .await
    .expect("every event should be handled");
}

#[tokio::test]
async fn test_same_source_events_keep_arrival_order() {
    let mut d = start(false, Some("org.gnome.ScreenSaver"), Config::default()).await;

    burst(
        &mut d,
        &[BusSignal::PrepareForSleep(true), BusSignal::PrepareForSleep(false)],
    )
    .await;

    assert_eq!(
        d.audio.calls(),
        vec![
            AudioCall::GetMuted,
            AudioCall::SetMuted(true),
            AudioCall::SetMuted(false)
        ]
    );

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mixed_source_events_keep_arrival_order() {
    let mut d = start(false, Some("org.gnome.ScreenSaver"), Config::default()).await;

    burst(
        &mut d,
        &[
            BusSignal::Lock,
            BusSignal::ActiveChanged(false),
            BusSignal::PrepareForSleep(true),
            BusSignal::Unlock,
        ],
    )
    .await;

    assert_eq!(
        d.audio.calls(),
        vec![
            AudioCall::GetMuted,
            AudioCall::SetMuted(true),
            AudioCall::SetMuted(false),
            AudioCall::GetMuted,
            AudioCall::SetMuted(true),
            AudioCall::SetMuted(false)
        ]
    );
    assert!(!d.audio.is_muted());
    assert!(!d.status.borrow().forced_mute);

    d.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mixed_source_order_on_multi_thread_runtime() {
    let mut d = start(false, Some("org.gnome.ScreenSaver"), Config::default()).await;

    burst(&mut d, &[BusSignal::Lock, BusSignal::ActiveChanged(false)]).await;

    assert_eq!(d.audio.set_calls(), vec![true, false]);
    assert!(!d.audio.is_muted());

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_backend_failure_does_not_stop_daemon() {
    let mut d = start(false, None, Config::default()).await;

    d.audio.fail_get(true);
    d.deliver(BusSignal::Lock).await;
    assert!(d.audio.set_calls().is_empty());

    d.audio.fail_get(false);
    d.deliver(BusSignal::Lock).await;
    assert_eq!(d.audio.set_calls(), vec![true]);

    d.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_caller_strategy_follows_pid_session() {
    init_tracing();
    let bus = MockBus::new();
    let bus_handle = bus.handle();
    bus_handle.set_pid_session(graphical_session(UID).handle());

    let mut config = Config::default();
    config.session.strategy = SessionStrategy::Caller;
    let mut daemon = daemon_with(config, &bus, MockAudio::new(false));
    let mut status = daemon.status_receiver();
    let events = daemon.event_sender();
    let handle = tokio::spawn(async move { daemon.run().await });

    let status = wait_for_status(&mut status, Duration::from_secs(5), |s| {
        s.sources.len() >= 2
    })
    .await
    .expect("adapters should register");
    assert_eq!(status.session.map(|s| s.id), Some("2".to_string()));

    events.send(DaemonEvent::Shutdown).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_no_session_fails_startup() {
    init_tracing();
    let bus = MockBus::new();
    let bus_handle = bus.handle();
    let mut other_user = graphical_session(UID + 1);
    other_user.id = "5".to_string();
    bus_handle.add_session(other_user, Some(SessionKind::X11));
    bus_handle.add_screensaver("org.gnome.ScreenSaver");

    let mut daemon = daemon_with(Config::default(), &bus, MockAudio::new(false));
    let err = daemon.run().await.unwrap_err();

    assert!(matches!(err, DaemonError::NoSessionFound { uid: UID }));
    assert!(bus_handle.subscriptions().is_empty());
}
