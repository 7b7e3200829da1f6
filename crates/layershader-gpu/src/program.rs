//! User shader compilation.
//!
//! Programs are compiled fresh for every invocation and released by `Drop`
//! exactly once, whether the run succeeds or fails. Compilation failures
//! carry the driver's info log verbatim — that text is the user's only
//! window into their shader, so nothing rewrites it.

use glium::program::{ComputeShader, ProgramCreationError};
use glium::Program;
use layershader_core::{Error, Result};
use layershader_glium::GlSession;

/// A compiled user program: a compute kernel or a vertex+fragment pair.
pub enum ShaderProgram {
    Compute(ComputeShader),
    Raster(Program),
}

impl ShaderProgram {
    /// Compile a compute kernel from user source.
    pub fn compile_compute(session: &GlSession<'_>, source: &str) -> Result<Self> {
        if !session.supports_compute() {
            return Err(Error::Compile(format!(
                "compute shaders require OpenGL 4.3 or newer (context is {})",
                session.version_string()
            )));
        }

        ComputeShader::from_source(session.facade(), source)
            .map(Self::Compute)
            .map_err(creation_error)
    }

    /// Compile and link a vertex+fragment pair from user source.
    pub fn compile_raster(
        session: &GlSession<'_>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        Program::from_source(session.facade(), vertex_source, fragment_source, None)
            .map(Self::Raster)
            .map_err(creation_error)
    }

    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute(_))
    }
}

fn creation_error(err: ProgramCreationError) -> Error {
    match err {
        ProgramCreationError::CompilationError(log, _) => Error::Compile(log),
        ProgramCreationError::LinkingError(log) => Error::Link(log),
        other => Error::Compile(other.to_string()),
    }
}
