//! Daemon configuration.
//!
//! There is no configuration file. [`Config::default`] is the stock
//! behavior; the CLI overrides individual fields from flags and environment
//! variables.

use std::str::FromStr;

use lockmute_audio::pactl::DEFAULT_SINK;
use lockmute_bus::ScreenSaverTarget;

use crate::error::DaemonError;

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub audio: AudioConfig,
    pub session: SessionConfig,
    pub screensaver: ScreenSaverConfig,
    pub controller: ControllerConfig,
}

/// Mixer command settings.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub program: String,
    pub sink: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            program: "pactl".to_string(),
            sink: DEFAULT_SINK.to_string(),
        }
    }
}

/// How the session to watch is found.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub strategy: SessionStrategy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStrategy {
    /// Enumerate sessions; ask for the caller's session if listing fails.
    #[default]
    Auto,
    /// Enumerate sessions and pick the current user's graphical one.
    Enumerate,
    /// Ask the manager for the session of pid 0.
    Caller,
}

impl FromStr for SessionStrategy {
    type Err = DaemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "enumerate" => Ok(Self::Enumerate),
            "caller" => Ok(Self::Caller),
            other => Err(DaemonError::Config(format!(
                "unknown session strategy `{other}` (expected auto, enumerate or caller)"
            ))),
        }
    }
}

/// Screensaver objects to try, in order. The first one present is used.
#[derive(Debug, Clone)]
pub struct ScreenSaverConfig {
    pub enabled: bool,
    pub targets: Vec<ScreenSaverTarget>,
}

impl Default for ScreenSaverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            targets: vec![ScreenSaverTarget::gnome(), ScreenSaverTarget::freedesktop()],
        }
    }
}

/// Mute state machine settings.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    pub relock: RelockPolicy,
}

/// What a lock event does while a forced mute is already in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelockPolicy {
    /// Query the device again and overwrite the remembered state.
    #[default]
    Recapture,
    /// Keep the state captured by the first lock; only re-assert the mute.
    KeepFirst,
}

impl FromStr for RelockPolicy {
    type Err = DaemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recapture" => Ok(Self::Recapture),
            "keep-first" => Ok(Self::KeepFirst),
            other => Err(DaemonError::Config(format!(
                "unknown relock policy `{other}` (expected recapture or keep-first)"
            ))),
        }
    }
}
