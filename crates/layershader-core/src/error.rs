//! Error types for the layershader pipeline.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a shader invocation.
///
/// Each variant corresponds to one stage of the pipeline and carries the raw
/// diagnostic for that stage. The `Display` text is what the host shows the
/// user, so driver logs are passed through unmodified.
#[derive(Debug, Error)]
pub enum Error {
    /// The host's color model or depth code is not something the GPU side
    /// can represent, or the supplied buffer does not match the derived
    /// layout. Raised before any GPU resource is allocated.
    #[error("unsupported pixel format: {0}")]
    Format(String),

    /// No usable rendering context was found at startup. Every invocation
    /// fails with this until the process restarts with a working GPU.
    #[error("GPU context is unavailable: {0}")]
    ContextUnavailable(String),

    /// User shader source failed to compile. Payload is the verbatim driver
    /// info log.
    #[error("shader compilation failed:\n{0}")]
    Compile(String),

    /// Vertex+fragment pair failed to link. Payload is the verbatim driver
    /// info log.
    #[error("shader program link failed:\n{0}")]
    Link(String),

    /// Failure while dispatching, drawing, synchronizing, or reading back.
    /// Resources are still released before this propagates.
    #[error("GPU execution failed: {0}")]
    Runtime(String),
}

impl Error {
    /// The diagnostic text a host should present to the user.
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}

/// A malformed execution parameter.
///
/// Unlike [`Error`], this never aborts a run: the field keeps its previous
/// value and the parse continues. Callers report these alongside the run's
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse {field}: {reason}")]
pub struct ParameterError {
    /// Which parameter failed to parse.
    pub field: &'static str,
    /// Why it failed, in host-displayable terms.
    pub reason: String,
}
