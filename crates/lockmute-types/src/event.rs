//! Normalized lock events.

/// Upstream signal family that produced a [`LockEvent`].
///
/// Only used for logging and status reporting. The controller reacts to every
/// source the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockSource {
    /// Session `Lock` / `Unlock` signals.
    Session,
    /// Manager `PrepareForSleep(bool)`.
    Sleep,
    /// Desktop screensaver `ActiveChanged(bool)`.
    ScreenSaver,
}

impl LockSource {
    /// Log message for a transition reported by this source.
    ///
    /// Screensaver lines are qualified with the screensaver's name by the
    /// caller.
    pub fn describe(self, locked: bool) -> &'static str {
        match (self, locked) {
            (Self::Sleep, true) => "System suspending",
            (Self::Sleep, false) => "System resuming",
            (Self::Session | Self::ScreenSaver, true) => "Screen locked",
            (Self::Session | Self::ScreenSaver, false) => "Screen unlocked",
        }
    }
}

impl std::fmt::Display for LockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Sleep => write!(f, "sleep"),
            Self::ScreenSaver => write!(f, "screensaver"),
        }
    }
}

/// The single internal event shape: `LockStateChanged(locked)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    pub source: LockSource,
    pub locked: bool,
}

impl LockEvent {
    pub fn new(source: LockSource, locked: bool) -> Self {
        Self { source, locked }
    }
}
