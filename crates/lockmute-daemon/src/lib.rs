//! Core daemon for lockmute.
//!
//! Turns session lock, system sleep and screensaver signals into one stream
//! of lock events and drives the mute state machine from it.

pub mod adapter;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod error;
pub mod locator;
pub mod setup;

pub use adapter::{AdapterKind, EventSourceAdapter};
pub use config::Config;
pub use controller::MuteController;
pub use daemon::{Daemon, DaemonEvent, DaemonStatus};
pub use error::DaemonError;
pub use locator::SessionLocator;
