//! lockmute: mute audio while the screen is locked or the machine sleeps.

mod logging;

use std::future::Future;
use std::process::ExitCode;

use clap::Parser;
use lockmute_bus::linux::LogindBus;
use lockmute_daemon::config::{Config, RelockPolicy, SessionStrategy};
use lockmute_daemon::{setup, Daemon, DaemonEvent};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Clean shutdown.
const EXIT_OK: u8 = 0;
/// Startup failure.
const EXIT_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(
    name = "lockmute",
    about = "Mute audio on screen lock and suspend, restore it on unlock",
    after_help = "All options are optional overrides. Without any, lockmute mutes the \
                  default PulseAudio sink via pactl and follows the session, sleep and \
                  desktop screensaver signals.",
    version
)]
struct Cli {
    /// Override the mixer program used to query and set the mute state.
    #[arg(long, env = "LOCKMUTE_MIXER", default_value = "pactl")]
    mixer: String,

    /// Override the sink to mute.
    #[arg(long, env = "LOCKMUTE_SINK", default_value = lockmute_audio::pactl::DEFAULT_SINK)]
    sink: String,

    /// Override how the session to follow is found: auto, enumerate or caller.
    #[arg(long, env = "LOCKMUTE_SESSION_STRATEGY", default_value = "auto")]
    session_strategy: SessionStrategy,

    /// Override what a lock does while lockmute already muted: recapture or keep-first.
    #[arg(long, env = "LOCKMUTE_RELOCK", default_value = "recapture")]
    relock: RelockPolicy,

    /// Do not listen to the desktop screensaver.
    #[arg(long, env = "LOCKMUTE_NO_SCREENSAVER")]
    no_screensaver: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        config.audio.program = self.mixer;
        config.audio.sink = self.sink;
        config.session.strategy = self.session_strategy;
        config.controller.relock = self.relock;
        config.screensaver.enabled = !self.no_screensaver;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    let config = Cli::parse().into_config();

    let status = match connect(config).await {
        Ok(daemon) => match interrupted() {
            Ok(shutdown) => serve(daemon, shutdown).await,
            Err(e) => exit_status(Err(e)),
        },
        Err(e) => exit_status(Err(e)),
    };
    ExitCode::from(status)
}

async fn connect(config: Config) -> anyhow::Result<Daemon> {
    let bus = LogindBus::connect().await?;
    let audio = setup::audio_backend(&config.audio);
    let uid = setup::current_uid();
    info!(uid, sink = %config.audio.sink, "starting lockmute");

    Ok(Daemon::new(
        config,
        uid,
        Box::new(bus.clone()),
        Box::new(bus),
        Box::new(audio),
    ))
}

/// Resolves on SIGINT or SIGTERM.
fn interrupted() -> anyhow::Result<impl Future<Output = ()> + Send + 'static> {
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    })
}

/// Run `daemon` until `shutdown` resolves and map the outcome to an exit status.
async fn serve<F>(mut daemon: Daemon, shutdown: F) -> u8
where
    F: Future<Output = ()> + Send + 'static,
{
    let events = daemon.event_sender();
    tokio::spawn(async move {
        shutdown.await;
        let _ = events.send(DaemonEvent::Shutdown);
    });

    exit_status(daemon.run().await.map_err(anyhow::Error::from))
}

fn exit_status(result: anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!("Error: {e:#}");
            EXIT_FAILURE
        }
    }
}
