//! Audio mute control for lockmute.
//!
//! This crate defines the [`AudioBackend`] trait the daemon drives. The only
//! real backend is [`PactlBackend`], which shells out to `pactl` against the
//! default sink. Enable the `mock` feature for an observable in-memory backend.

use async_trait::async_trait;

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod pactl;

pub use error::AudioError;
pub use pactl::PactlBackend;

/// Mute control of the default output device.
#[async_trait]
pub trait AudioBackend: Send + 'static {
    /// Query whether the device is currently muted.
    async fn get_muted(&mut self) -> Result<bool, AudioError>;

    /// Set the mute state of the device.
    async fn set_muted(&mut self, muted: bool) -> Result<(), AudioError>;
}
