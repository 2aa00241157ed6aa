//! `pactl`-based mute control.

use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::AudioError;
use crate::AudioBackend;

/// The PulseAudio / PipeWire name for whichever sink is currently default.
pub const DEFAULT_SINK: &str = "@DEFAULT_SINK@";

/// Mute control through the `pactl` command-line client.
///
/// Every call spawns one child process and waits for it. No timeout is
/// applied.
#[derive(Debug, Clone)]
pub struct PactlBackend {
    program: String,
    sink: String,
}

impl Default for PactlBackend {
    fn default() -> Self {
        Self::new("pactl", DEFAULT_SINK)
    }
}

impl PactlBackend {
    pub fn new(program: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            sink: sink.into(),
        }
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    async fn run(&self, args: &[&str]) -> Result<Output, AudioError> {
        debug!(program = %self.program, ?args, "running mixer command");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AudioError::Status {
                command: format!("{} {}", self.program, args.join(" ")),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Interpret the reply of `get-sink-mute`, e.g. `"Mute: yes"`.
pub fn parse_mute_reply(stdout: &[u8]) -> Result<bool, AudioError> {
    let text = std::str::from_utf8(stdout)
        .map_err(|e| AudioError::Parse(format!("reply is not UTF-8: {e}")))?;
    Ok(text.to_lowercase().contains("yes"))
}

#[async_trait]
impl AudioBackend for PactlBackend {
    async fn get_muted(&mut self) -> Result<bool, AudioError> {
        let output = self.run(&["get-sink-mute", &self.sink]).await?;
        parse_mute_reply(&output.stdout)
    }

    async fn set_muted(&mut self, muted: bool) -> Result<(), AudioError> {
        let value = if muted { "1" } else { "0" };
        self.run(&["set-sink-mute", &self.sink, value]).await?;
        Ok(())
    }
}
