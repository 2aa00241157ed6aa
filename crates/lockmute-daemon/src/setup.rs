//! Process identity and backend construction.

use lockmute_audio::PactlBackend;
use nix::unistd::getuid;

use crate::config::AudioConfig;

/// Real user id of the invoking process.
pub fn current_uid() -> u32 {
    getuid().as_raw()
}

/// Build the mixer backend described by the audio settings.
pub fn audio_backend(config: &AudioConfig) -> PactlBackend {
    PactlBackend::new(config.program.clone(), config.sink.clone())
}
