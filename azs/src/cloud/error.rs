//! Cloud command error taxonomy

use std::time::Duration;

use thiserror::Error;

/// Failure modes of a cloud CLI invocation.
///
/// Every variant is recoverable: the reducer surfaces it as a diagnostic
/// and keeps running. Only startup errors terminate the process.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The child did not complete before its deadline. The process is
    /// reaped; state is unchanged; the user may retry.
    #[error("'{program}' timed out after {deadline:?}")]
    Timeout { program: String, deadline: Duration },

    /// The child could not be launched at all (missing binary, perms)
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit; stderr captured (truncated)
    #[error("'{program}' exited with code {exit_code}")]
    Failed {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    /// Output was produced but could not be parsed as expected
    #[error("could not decode '{program}' output: {detail}")]
    Decode { program: String, detail: String },

    /// Aborted during shutdown. Surfaced nowhere.
    #[error("operation cancelled")]
    Cancelled,
}

impl CloudError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// One-line diagnostic for the status log / content pane
    pub fn user_line(&self) -> String {
        match self {
            Self::Timeout { program, deadline } => {
                format!("{} timed out after {}s - press r to retry", program, deadline.as_secs())
            }
            Self::Spawn { program, source } => format!("cannot launch {}: {}", program, source),
            Self::Failed {
                program,
                exit_code,
                stderr,
            } => {
                let first = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                format!("{} failed (exit {}): {}", program, exit_code, first)
            }
            Self::Decode { program, detail } => format!("{} returned unreadable output: {}", program, detail),
            Self::Cancelled => "cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_line_failed_takes_first_stderr_line() {
        let err = CloudError::Failed {
            program: "az".to_string(),
            exit_code: 3,
            stderr: "\nERROR: not logged in\nrun az login\n".to_string(),
        };
        assert_eq!(err.user_line(), "az failed (exit 3): ERROR: not logged in");
    }

    #[test]
    fn test_timeout_classification() {
        let err = CloudError::Timeout {
            program: "az".to_string(),
            deadline: Duration::from_secs(10),
        };
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
    }
}
