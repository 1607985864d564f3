//! Blocking status probe backed by an external process
//!
//! One process is spawned per invocation. There is no timeout: a hung
//! process stalls the calling cycle until it exits, which the poll loop
//! reports in its logs.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Outcome of one probe invocation
#[derive(Debug)]
pub enum ProbeResult {
    /// Captured standard output, possibly empty
    Payload(String),
    /// The probe produced no usable answer
    Failure(ProbeError),
}

/// Reasons a probe invocation yields no payload
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to run probe process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("probe output is not valid UTF-8")]
    InvalidOutput,

    #[error("probe task aborted: {0}")]
    Aborted(String),
}

/// Anything that can answer "what is the status right now" for a script
pub trait StatusProbe: Send + Sync {
    /// Run the script and block until an answer is available
    fn invoke(&self, script: &str) -> ProbeResult;
}

/// Runs `program args... <script>` and captures its stdout
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl StatusProbe for CommandProbe {
    fn invoke(&self, script: &str) -> ProbeResult {
        let output = match Command::new(&self.program)
            .args(&self.args)
            .arg(script)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(%e, program = ?self.program, "probe process could not be started");
                return ProbeResult::Failure(e.into());
            }
        };

        if !output.stderr.is_empty() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "probe wrote to stderr"
            );
        }

        if !output.status.success() {
            debug!(status = %output.status, "probe exited unsuccessfully");
        }

        match String::from_utf8(output.stdout) {
            Ok(payload) => ProbeResult::Payload(payload),
            Err(_) => {
                warn!("probe output is not valid UTF-8");
                ProbeResult::Failure(ProbeError::InvalidOutput)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> CommandProbe {
        CommandProbe::new("/bin/sh", vec!["-c".into()])
    }

    #[test]
    fn test_stdout_is_the_payload() {
        match sh().invoke("echo Unmuted") {
            ProbeResult::Payload(payload) => assert_eq!(payload, "Unmuted\n"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_stderr_is_discarded() {
        match sh().invoke("echo oops >&2") {
            ProbeResult::Payload(payload) => assert!(payload.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_nonzero_exit_keeps_payload() {
        match sh().invoke("echo partial; exit 3") {
            ProbeResult::Payload(payload) => assert_eq!(payload.trim(), "partial"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_failure() {
        let probe = CommandProbe::new("/nonexistent/probe-binary", vec![]);
        assert!(matches!(
            probe.invoke("anything"),
            ProbeResult::Failure(ProbeError::Spawn(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_failure() {
        assert!(matches!(
            sh().invoke(r"printf '\377\376'"),
            ProbeResult::Failure(ProbeError::InvalidOutput)
        ));
    }
}
