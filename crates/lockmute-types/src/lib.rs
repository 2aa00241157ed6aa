//! Shared types for lockmute.
//!
//! This crate contains the value types passed between the lockmute crates:
//! the normalized lock event every signal source is translated into, and the
//! session records returned by the session manager.

pub mod event;
pub mod session;

pub use event::{LockEvent, LockSource};
pub use session::{SessionHandle, SessionKind, SessionRecord};
