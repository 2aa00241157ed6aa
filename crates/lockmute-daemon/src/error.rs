//! Daemon errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no session found for UID {uid}")]
    NoSessionFound { uid: u32 },

    #[error("bus error: {0}")]
    Bus(#[from] lockmute_bus::BusError),
}
