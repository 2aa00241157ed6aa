//! Mock audio backend for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::AudioError;
use crate::AudioBackend;

/// Recorded backend call for test observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    GetMuted,
    SetMuted(bool),
}

/// Shared state for observing what `MockAudio` did.
#[derive(Debug, Default)]
struct MockAudioState {
    muted: bool,
    calls: Vec<AudioCall>,
    fail_get: bool,
    fail_set: bool,
}

/// In-memory audio device.
///
/// `set_muted` updates the simulated device, so a later `get_muted` observes
/// the daemon's own writes the way a real sink would.
pub struct MockAudio {
    state: Arc<Mutex<MockAudioState>>,
}

impl Default for MockAudio {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MockAudio {
    /// Create a mock device with the given initial mute state.
    pub fn new(muted: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockAudioState {
                muted,
                ..MockAudioState::default()
            })),
        }
    }

    /// Get a clonable handle for observing and steering the device from tests.
    pub fn handle(&self) -> MockAudioHandle {
        MockAudioHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable observer handle for `MockAudio`.
#[derive(Clone)]
pub struct MockAudioHandle {
    state: Arc<Mutex<MockAudioState>>,
}

impl MockAudioHandle {
    /// Current simulated mute state.
    pub fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    /// Change the mute state behind the daemon's back, as the user would.
    pub fn set_muted_externally(&self, muted: bool) {
        self.state.lock().unwrap().muted = muted;
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<AudioCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Only the `set_muted` arguments, in call order.
    pub fn set_calls(&self) -> Vec<bool> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                AudioCall::SetMuted(muted) => Some(*muted),
                AudioCall::GetMuted => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make subsequent `get_muted` calls fail.
    pub fn fail_get(&self, fail: bool) {
        self.state.lock().unwrap().fail_get = fail;
    }

    /// Make subsequent `set_muted` calls fail.
    pub fn fail_set(&self, fail: bool) {
        self.state.lock().unwrap().fail_set = fail;
    }
}

#[async_trait]
impl AudioBackend for MockAudio {
    async fn get_muted(&mut self) -> Result<bool, AudioError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AudioCall::GetMuted);
        if state.fail_get {
            return Err(AudioError::Other(anyhow::anyhow!("mock get_muted failure")));
        }
        Ok(state.muted)
    }

    async fn set_muted(&mut self, muted: bool) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AudioCall::SetMuted(muted));
        if state.fail_set {
            return Err(AudioError::Other(anyhow::anyhow!("mock set_muted failure")));
        }
        state.muted = muted;
        Ok(())
    }
}
