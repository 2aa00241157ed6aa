//! Audio backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Status {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("unparsable mute state: {0}")]
    Parse(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
