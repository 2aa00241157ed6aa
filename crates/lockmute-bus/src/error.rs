//! Bus subsystem errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("cannot connect to the {bus} bus: {reason}")]
    Connection { bus: &'static str, reason: String },

    #[error("{0} is not present on the bus")]
    Unavailable(String),

    #[error("{method} failed: {reason}")]
    Call { method: String, reason: String },

    #[error("failed to subscribe to {subject}: {reason}")]
    Subscribe { subject: String, reason: String },
}

impl BusError {
    /// Whether the error means the target object simply is not there.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn call(method: &str, reason: impl std::fmt::Display) -> Self {
        Self::Call {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}
