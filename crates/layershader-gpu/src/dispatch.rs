//! The two invocation protocols: compute dispatch and raster draw.
//!
//! Each dispatcher walks the same state machine — `Configured → Dispatched →
//! Completed | Failed` — and blocks until the GPU finishes before returning,
//! so readback never overlaps execution. Runtime failures are converted to
//! [`Error::Runtime`] and leave the dispatcher in `Failed`; resource release
//! is the caller's guaranteed cleanup and is never skipped.

use glium::index::{NoIndices, PrimitiveType};
use glium::uniforms::{
    MagnifySamplerFilter, MinifySamplerFilter, SamplerBehavior, SamplerWrapFunction,
    UniformType, UniformValue, Uniforms,
};
use glium::Surface;
use layershader_core::{ComputeRequest, Error, RasterRequest, Result, Topology};
use layershader_glium::GlSession;
use tracing::debug;

use crate::program::ShaderProgram;
use crate::textures::{gl_format, TextureSet};
use crate::validate::{clear_gl_errors, drain_gl_errors};

/// Execution state of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Configured,
    Dispatched,
    Completed,
    Failed,
}

/// Runs a compute kernel over the invocation's textures.
pub struct ComputeDispatcher {
    request: ComputeRequest,
    state: DispatchState,
}

impl ComputeDispatcher {
    pub fn new(request: ComputeRequest) -> Self {
        Self {
            request,
            state: DispatchState::Configured,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Dispatch the kernel and block until the GPU completes.
    ///
    /// The output texture is bound as a read-write image at unit 0, the
    /// input as a read-only image at unit 1 — the user's source must declare
    /// matching bindings.
    pub fn run(
        &mut self,
        _session: &GlSession<'_>,
        program: &ShaderProgram,
        textures: &TextureSet,
    ) -> Result<()> {
        let ShaderProgram::Compute(kernel) = program else {
            self.state = DispatchState::Failed;
            return Err(Error::Runtime(
                "compute dispatch invoked with a raster program".into(),
            ));
        };

        self.state = DispatchState::Dispatched;
        let fmt = gl_format(&textures.format());

        clear_gl_errors();
        unsafe {
            gl::BindImageTexture(
                0,
                textures.output_id(),
                0,
                gl::FALSE,
                0,
                gl::READ_WRITE,
                fmt.internal,
            );
            gl::BindImageTexture(
                1,
                textures.input_id(),
                0,
                gl::FALSE,
                0,
                gl::READ_ONLY,
                fmt.internal,
            );
        }

        debug!(
            x = self.request.x,
            y = self.request.y,
            z = self.request.z,
            "dispatching compute kernel"
        );
        kernel.execute(
            glium::uniforms::EmptyUniforms,
            self.request.x,
            self.request.y,
            self.request.z,
        );

        // Hard synchronous wait: image writes must land before readback.
        unsafe {
            gl::MemoryBarrier(gl::ALL_BARRIER_BITS);
            gl::Finish();
        }

        if let Some(errors) = drain_gl_errors() {
            self.state = DispatchState::Failed;
            return Err(Error::Runtime(format!("compute dispatch raised {errors}")));
        }

        self.state = DispatchState::Completed;
        Ok(())
    }
}

/// Runs a vertex+fragment pair into the invocation's output texture.
pub struct RasterDispatcher {
    request: RasterRequest,
    state: DispatchState,
}

impl RasterDispatcher {
    pub fn new(request: RasterRequest) -> Self {
        Self {
            request,
            state: DispatchState::Configured,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Draw and block until the GPU completes.
    ///
    /// The vertex stream carries no attributes: with the sentinel count the
    /// draw processes the stream's inherent zero vertices, an explicit count
    /// processes exactly that many, and shaders synthesize positions from
    /// `gl_VertexID`.
    pub fn run(
        &mut self,
        session: &GlSession<'_>,
        program: &ShaderProgram,
        textures: &TextureSet,
    ) -> Result<()> {
        let ShaderProgram::Raster(pipeline) = program else {
            self.state = DispatchState::Failed;
            return Err(Error::Runtime(
                "raster dispatch invoked with a compute kernel".into(),
            ));
        };

        self.state = DispatchState::Dispatched;
        clear_gl_errors();

        let input = textures.wrap_input(session);
        let output = textures.wrap_output(session);

        let mut target = match textures.create_framebuffer(session, &output) {
            Ok(fb) => fb,
            Err(e) => {
                self.state = DispatchState::Failed;
                return Err(e);
            }
        };
        target.clear_color(0.0, 0.0, 0.0, 0.0);

        let vertex_count = self.request.vertex_count.unwrap_or(0) as usize;
        let vertices = glium::vertex::EmptyVertexAttributes { len: vertex_count };
        let indices = NoIndices(primitive_type(self.request.topology));
        let samplers = InputSamplers::for_program(pipeline, &input);

        debug!(
            vertex_count,
            topology = ?self.request.topology,
            "drawing raster pair"
        );
        if let Err(e) = target.draw(
            vertices,
            &indices,
            pipeline,
            &samplers,
            &glium::DrawParameters::default(),
        ) {
            self.state = DispatchState::Failed;
            return Err(Error::Runtime(format!("draw failed: {e}")));
        }

        unsafe { gl::Finish() };

        if let Some(errors) = drain_gl_errors() {
            self.state = DispatchState::Failed;
            return Err(Error::Runtime(format!("raster draw raised {errors}")));
        }

        self.state = DispatchState::Completed;
        Ok(())
    }
}

fn primitive_type(topology: Topology) -> PrimitiveType {
    match topology {
        Topology::Points => PrimitiveType::Points,
        Topology::Lines => PrimitiveType::LinesList,
        Topology::LineLoop => PrimitiveType::LineLoop,
        Topology::LineStrip => PrimitiveType::LineStrip,
        Topology::Triangles => PrimitiveType::TrianglesList,
        Topology::TriangleStrip => PrimitiveType::TriangleStrip,
        Topology::TriangleFan => PrimitiveType::TriangleFan,
    }
}

/// Binds the input layer to every `sampler2D` uniform the user program
/// declares, with nearest/clamp sampling so the round trip stays exact.
struct InputSamplers<'a> {
    names: Vec<&'a str>,
    texture: &'a glium::Texture2d,
}

impl<'a> InputSamplers<'a> {
    fn for_program(program: &'a glium::Program, texture: &'a glium::Texture2d) -> Self {
        let names = program
            .uniforms()
            .filter(|(_, uniform)| uniform.ty == UniformType::Sampler2d)
            .map(|(name, _)| name.as_str())
            .collect();
        Self { names, texture }
    }
}

impl Uniforms for InputSamplers<'_> {
    fn visit_values<'b, F: FnMut(&str, UniformValue<'b>)>(&'b self, mut visit: F) {
        let behavior = SamplerBehavior {
            minify_filter: MinifySamplerFilter::Nearest,
            magnify_filter: MagnifySamplerFilter::Nearest,
            wrap_function: (
                SamplerWrapFunction::Clamp,
                SamplerWrapFunction::Clamp,
                SamplerWrapFunction::Clamp,
            ),
            ..Default::default()
        };
        for name in &self.names {
            visit(name, UniformValue::Texture2d(self.texture, Some(behavior)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_type_table() {
        assert_eq!(primitive_type(Topology::Points), PrimitiveType::Points);
        assert_eq!(primitive_type(Topology::LineLoop), PrimitiveType::LineLoop);
        assert_eq!(
            primitive_type(Topology::Triangles),
            PrimitiveType::TrianglesList
        );
        assert_eq!(
            primitive_type(Topology::TriangleFan),
            PrimitiveType::TriangleFan
        );
    }

    #[test]
    fn test_dispatchers_start_configured() {
        let compute = ComputeDispatcher::new(ComputeRequest::default());
        assert_eq!(compute.state(), DispatchState::Configured);

        let raster = RasterDispatcher::new(RasterRequest::default());
        assert_eq!(raster.state(), DispatchState::Configured);
    }
}
