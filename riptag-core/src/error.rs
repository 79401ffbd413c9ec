//! Error types, from the raw tool and provider failures up to the
//! cloneable [`WorkflowError`] the controller displays.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::model::CandidateKind;

/// Failure from invoking one of the external command-line tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Neither an override nor a search found the executable.
    #[error("{tool} was not found")]
    NotFound {
        /// Executable name.
        tool: &'static str,
        /// Install instructions shown to the user.
        hint: &'static str,
    },
    /// The process was killed after running past its limit.
    #[error("{tool} timed out after {after:?}")]
    Timeout {
        /// Executable name.
        tool: &'static str,
        /// The limit that was exceeded.
        after: Duration,
    },
    /// Non-zero exit.
    #[error("{tool} exited with {status}:\n{output}")]
    Failed {
        /// Executable name.
        tool: &'static str,
        /// Exit status as printed by the OS.
        status: String,
        /// Stdout followed by stderr.
        output: String,
    },
    /// The process could not be started or waited on.
    #[error("failed to start {tool}")]
    Spawn {
        /// Executable name.
        tool: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Exit was clean but the output made no sense.
    #[error("could not read {tool} output: {message}")]
    Parse {
        /// Executable name.
        tool: &'static str,
        /// What was wrong with the output.
        message: String,
    },
}

/// Failure from one of the HTTP metadata services.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, TLS or body transfer failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// An unexpected HTTP status.
    #[error("{provider} returned HTTP {status}")]
    Status {
        /// Service name.
        provider: &'static str,
        /// The status code received.
        status: u16,
    },
    /// The body did not match the expected shape.
    #[error("{provider} response could not be parsed: {message}")]
    Parse {
        /// Service name.
        provider: &'static str,
        /// Decoder message.
        message: String,
    },
    /// No answer within the configured limit.
    #[error("{provider} did not answer within {after:?}")]
    Timeout {
        /// Service name.
        provider: &'static str,
        /// The limit that was exceeded.
        after: Duration,
    },
    /// A downloaded asset could not be written to disk.
    #[error("failed to store {}", path.display())]
    Io {
        /// Destination file.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// A candidate payload was accessed as the wrong kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected a {expected:?} candidate, found {found:?}")]
pub struct PayloadMismatch {
    /// Kind the caller asked for.
    pub expected: CandidateKind,
    /// Kind the candidate actually is.
    pub found: CandidateKind,
}

/// Errors carried by completion messages back into the controller.
///
/// Values are flattened to text so they can cross the task boundary and be
/// rendered without holding on to I/O or HTTP handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A required executable is missing. The wizard exits after showing it.
    #[error("{tool} was not found.\n{hint}")]
    DependencyMissing {
        /// Executable name.
        tool: String,
        /// Install instructions.
        hint: String,
    },
    /// A tool call or lookup ran past its limit.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// What was running.
        operation: String,
        /// The limit that was exceeded.
        after: Duration,
    },
    /// A metadata service failed or answered nonsense.
    #[error("{provider} lookup failed: {message}")]
    Lookup {
        /// Service or tool name.
        provider: String,
        /// Human readable cause.
        message: String,
    },
    /// A search that must produce something produced nothing.
    #[error("{0}")]
    EmptyResult(String),
    /// A tool exited unsuccessfully.
    #[error("{tool} failed:\n{output}")]
    ExternalTool {
        /// Executable name.
        tool: String,
        /// What it printed.
        output: String,
    },
    /// The per-attempt scratch directory could not be used.
    #[error("scratch area error: {0}")]
    Scratch(String),
}

impl WorkflowError {
    /// Missing dependencies end the program instead of restarting.
    pub fn is_dependency_missing(&self) -> bool {
        matches!(self, WorkflowError::DependencyMissing { .. })
    }

    /// True for [`WorkflowError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkflowError::Timeout { .. })
    }
}

impl From<ToolError> for WorkflowError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound { tool, hint } => {
                WorkflowError::DependencyMissing {
                    tool: tool.to_string(),
                    hint: hint.to_string(),
                }
            }
            ToolError::Timeout { tool, after } => WorkflowError::Timeout {
                operation: tool.to_string(),
                after,
            },
            ToolError::Failed { tool, status, output } => {
                let output = if output.trim().is_empty() {
                    format!("exited with {status}")
                } else {
                    output
                };
                WorkflowError::ExternalTool {
                    tool: tool.to_string(),
                    output,
                }
            }
            ToolError::Spawn { tool, source } => WorkflowError::ExternalTool {
                tool: tool.to_string(),
                output: source.to_string(),
            },
            ToolError::Parse { tool, message } => WorkflowError::Lookup {
                provider: tool.to_string(),
                message,
            },
        }
    }
}

impl From<ProviderError> for WorkflowError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout { provider, after } => {
                WorkflowError::Timeout {
                    operation: format!("{provider} request"),
                    after,
                }
            }
            ProviderError::Status { provider, status } => {
                WorkflowError::Lookup {
                    provider: provider.to_string(),
                    message: format!("HTTP {status}"),
                }
            }
            ProviderError::Parse { provider, message } => {
                WorkflowError::Lookup {
                    provider: provider.to_string(),
                    message,
                }
            }
            ProviderError::Network(source) => WorkflowError::Lookup {
                provider: "network".to_string(),
                message: source.to_string(),
            },
            ProviderError::Io { path, source } => WorkflowError::Scratch(
                format!("{}: {source}", path.display()),
            ),
        }
    }
}

impl From<PayloadMismatch> for WorkflowError {
    fn from(err: PayloadMismatch) -> Self {
        WorkflowError::Lookup {
            provider: "catalog".to_string(),
            message: err.to_string(),
        }
    }
}
