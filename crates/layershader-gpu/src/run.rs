//! Top-level invocation entry points.
//!
//! Each function performs one complete, synchronous shader invocation under
//! an exclusive context acquisition: translate the format, create the
//! textures, compile the user source, execute, read back, release. Every
//! exit path — format rejection, compile failure, runtime failure, success —
//! releases all GPU resources created for the invocation before returning.

use layershader_core::{ComputeRequest, LayerInput, RasterRequest, Result};
use layershader_glium::GpuContext;
use tracing::debug;

use crate::dispatch::{ComputeDispatcher, RasterDispatcher};
use crate::program::ShaderProgram;
use crate::readback::read_output;
use crate::textures::TextureSet;

/// Run a user compute kernel over the host layer.
///
/// On success the returned buffer has the input's dimensions and format and
/// can be inserted by the host as a new layer. On failure the error's
/// `Display` text is the stage diagnostic to show the user.
pub fn run_compute(
    ctx: &GpuContext,
    input: &LayerInput<'_>,
    source: &str,
    request: &ComputeRequest,
) -> Result<Vec<u8>> {
    // Resolve the format first: an unrecognized descriptor aborts before any
    // GPU resource exists.
    let format = input.format()?;

    ctx.with_context(|session| {
        session.activate()?;
        debug!(
            width = input.width,
            height = input.height,
            ?format,
            "compute invocation"
        );

        let mut textures = TextureSet::new(input.width, input.height, format);
        textures.create_input(session, input.pixels)?;
        textures.create_output(session)?;

        // Early returns from here on release the textures through Drop and
        // the program through its own Drop.
        let program = ShaderProgram::compile_compute(session, source)?;

        let mut dispatcher = ComputeDispatcher::new(*request);
        dispatcher.run(session, &program, &textures)?;

        let pixels = read_output(session, &textures)?;
        textures.release_all();
        Ok(pixels)
    })
}

/// Run a user vertex+fragment pair, rasterizing into the output layer.
///
/// The input layer is available to the fragment stage through its
/// `sampler2D` uniforms; no vertex attribute data is ever uploaded.
pub fn run_raster(
    ctx: &GpuContext,
    input: &LayerInput<'_>,
    vertex_source: &str,
    fragment_source: &str,
    request: &RasterRequest,
) -> Result<Vec<u8>> {
    let format = input.format()?;

    ctx.with_context(|session| {
        session.activate()?;
        debug!(
            width = input.width,
            height = input.height,
            ?format,
            "raster invocation"
        );

        let mut textures = TextureSet::new(input.width, input.height, format);
        textures.create_input(session, input.pixels)?;
        textures.create_output(session)?;

        let program = ShaderProgram::compile_raster(session, vertex_source, fragment_source)?;

        let mut dispatcher = RasterDispatcher::new(*request);
        dispatcher.run(session, &program, &textures)?;

        let pixels = read_output(session, &textures)?;
        textures.release_all();
        Ok(pixels)
    })
}
