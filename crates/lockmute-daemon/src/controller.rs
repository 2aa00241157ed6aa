//! Mute state machine.
//!
//! The controller owns the only piece of state that matters: whether the
//! device was already muted when the daemon last forced a mute. A lock event
//! captures that state and then mutes; an unlock event restores sound only if
//! the device was not muted before the lock.
//!
//! Backend failures never escape a transition. They are logged and the
//! transition is treated as complete; the next lock cycle starts over.

use lockmute_audio::AudioBackend;
use lockmute_types::LockEvent;
use tracing::{debug, error, info};

use crate::config::RelockPolicy;

pub struct MuteController {
    backend: Box<dyn AudioBackend>,
    relock: RelockPolicy,
    /// Device state observed right before the last forced mute.
    was_muted_before_lock: bool,
    /// A forced mute is in place and no unlock has been seen since.
    forced_mute: bool,
}

impl MuteController {
    pub fn new(backend: Box<dyn AudioBackend>, relock: RelockPolicy) -> Self {
        Self {
            backend,
            relock,
            was_muted_before_lock: false,
            forced_mute: false,
        }
    }

    pub fn was_muted_before_lock(&self) -> bool {
        self.was_muted_before_lock
    }

    pub fn is_forced_mute(&self) -> bool {
        self.forced_mute
    }

    /// Apply one normalized event. The source plays no part.
    pub async fn handle(&mut self, event: LockEvent) {
        if event.locked {
            self.on_lock().await;
        } else {
            self.on_unlock().await;
        }
    }

    async fn on_lock(&mut self) {
        if self.forced_mute && self.relock == RelockPolicy::KeepFirst {
            debug!(
                was_muted = self.was_muted_before_lock,
                "already force-muted, keeping captured state"
            );
        } else {
            // Captured before the write below, never after.
            match self.backend.get_muted().await {
                Ok(muted) => self.was_muted_before_lock = muted,
                Err(e) => {
                    error!(error = %e, "Failed to mute audio");
                    return;
                }
            }
        }

        match self.backend.set_muted(true).await {
            Ok(()) => {
                self.forced_mute = true;
                info!(
                    "Audio muted (was previously muted: {})",
                    self.was_muted_before_lock
                );
            }
            Err(e) => error!(error = %e, "Failed to mute audio"),
        }
    }

    async fn on_unlock(&mut self) {
        self.forced_mute = false;
        if self.was_muted_before_lock {
            info!("Audio kept muted (was muted before lock)");
            return;
        }
        match self.backend.set_muted(false).await {
            Ok(()) => info!("Audio unmuted"),
            Err(e) => error!(error = %e, "Failed to unmute audio"),
        }
    }
}
