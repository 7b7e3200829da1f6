//! Texture resources for one shader invocation.
//!
//! A [`TextureSet`] owns the input and output textures of a single run. Both
//! share the host canvas's dimensions and the derived [`PixelFormat`], and
//! both are released exactly once — explicitly via
//! [`release_all`](TextureSet::release_all) on the success path, or by `Drop`
//! on every early-exit path.

use gl::types::{GLenum, GLint, GLuint};
use glium::framebuffer::SimpleFrameBuffer;
use layershader_core::{DepthCode, Error, PixelFormat, Result};
use layershader_glium::GlSession;
use tracing::trace;

use crate::validate::{clear_gl_errors, drain_gl_errors};

/// The GL upload/readback triple derived from a [`PixelFormat`]:
/// sized internal format, client pixel format, and client component type.
pub(crate) struct GlFormat {
    pub internal: GLenum,
    pub pixel: GLenum,
    pub ty: GLenum,
}

pub(crate) fn gl_format(format: &PixelFormat) -> GlFormat {
    let c = format.channels() as usize - 1;
    let (internal, ty): ([GLenum; 4], GLenum) = match format.depth() {
        DepthCode::U8 => ([gl::R8, gl::RG8, gl::RGB8, gl::RGBA8], gl::UNSIGNED_BYTE),
        DepthCode::U16 => (
            [gl::R16, gl::RG16, gl::RGB16, gl::RGBA16],
            gl::UNSIGNED_SHORT,
        ),
        DepthCode::S8 => (
            [gl::R8_SNORM, gl::RG8_SNORM, gl::RGB8_SNORM, gl::RGBA8_SNORM],
            gl::BYTE,
        ),
        DepthCode::S16 => (
            [
                gl::R16_SNORM,
                gl::RG16_SNORM,
                gl::RGB16_SNORM,
                gl::RGBA16_SNORM,
            ],
            gl::SHORT,
        ),
        DepthCode::F16 => ([gl::R16F, gl::RG16F, gl::RGB16F, gl::RGBA16F], gl::HALF_FLOAT),
        DepthCode::F32 => ([gl::R32F, gl::RG32F, gl::RGB32F, gl::RGBA32F], gl::FLOAT),
    };
    let pixel = [gl::RED, gl::RG, gl::RGB, gl::RGBA][c];
    GlFormat {
        internal: internal[c],
        pixel,
        ty,
    }
}

/// The input and output textures of one invocation.
pub struct TextureSet {
    input: GLuint,
    output: GLuint,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl TextureSet {
    /// Create an empty set. Textures are allocated by
    /// [`create_input`](Self::create_input) /
    /// [`create_output`](Self::create_output).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            input: 0,
            output: 0,
            width,
            height,
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// GL name of the input texture, 0 until created.
    pub fn input_id(&self) -> u32 {
        self.input
    }

    /// GL name of the output texture, 0 until created.
    pub fn output_id(&self) -> u32 {
        self.output
    }

    /// Upload the host layer into the input texture.
    ///
    /// `data` must be tightly packed in this set's format; a length mismatch
    /// fails before the texture is allocated.
    pub fn create_input(&mut self, _session: &GlSession<'_>, data: &[u8]) -> Result<()> {
        let expected = self.format.buffer_len(self.width, self.height);
        if data.len() != expected {
            return Err(Error::Format(format!(
                "input buffer is {} bytes, expected {expected}",
                data.len()
            )));
        }

        self.input = self.allocate("input", Some(data))?;
        Ok(())
    }

    /// Allocate the output texture, zero-initialized.
    pub fn create_output(&mut self, _session: &GlSession<'_>) -> Result<()> {
        let zeros = vec![0u8; self.format.buffer_len(self.width, self.height)];
        self.output = self.allocate("output", Some(&zeros))?;
        Ok(())
    }

    fn allocate(&self, label: &str, data: Option<&[u8]>) -> Result<GLuint> {
        let fmt = gl_format(&self.format);
        let mut name: GLuint = 0;

        clear_gl_errors();
        unsafe {
            gl::GenTextures(1, &mut name);
            gl::BindTexture(gl::TEXTURE_2D, name);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
            gl::TexParameteri(
                gl::TEXTURE_2D,
                gl::TEXTURE_WRAP_S,
                gl::CLAMP_TO_EDGE as GLint,
            );
            gl::TexParameteri(
                gl::TEXTURE_2D,
                gl::TEXTURE_WRAP_T,
                gl::CLAMP_TO_EDGE as GLint,
            );
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                fmt.internal as GLint,
                self.width as GLint,
                self.height as GLint,
                0,
                fmt.pixel,
                fmt.ty,
                data.map_or(std::ptr::null(), |d| d.as_ptr().cast()),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }

        if let Some(errors) = drain_gl_errors() {
            unsafe { gl::DeleteTextures(1, &name) };
            return Err(Error::Runtime(format!(
                "could not allocate {label} texture ({}x{}): {errors}",
                self.width, self.height
            )));
        }

        trace!(label, name, "texture allocated");
        Ok(name)
    }

    /// Wrap the input texture for sampling through glium.
    pub fn wrap_input(&self, session: &GlSession<'_>) -> glium::Texture2d {
        debug_assert!(self.input != 0, "input texture not created");
        self.wrap(session, self.input)
    }

    /// Wrap the output texture for use as a glium color attachment.
    pub fn wrap_output(&self, session: &GlSession<'_>) -> glium::Texture2d {
        debug_assert!(self.output != 0, "output texture not created");
        self.wrap(session, self.output)
    }

    /// Attach the (wrapped) output texture as the sole color attachment of a
    /// fresh framebuffer. The framebuffer is scoped to the draw that uses it
    /// and releases itself when dropped.
    pub fn create_framebuffer<'a>(
        &self,
        session: &GlSession<'_>,
        output: &'a glium::Texture2d,
    ) -> Result<SimpleFrameBuffer<'a>> {
        SimpleFrameBuffer::new(session.facade(), output).map_err(|e| {
            Error::Runtime(format!(
                "could not attach the output texture to a framebuffer: {e}"
            ))
        })
    }

    fn wrap(&self, session: &GlSession<'_>, name: GLuint) -> glium::Texture2d {
        // owned = false: the wrapper borrows the name, release stays with
        // this set.
        unsafe {
            glium::Texture2d::from_id(
                session.facade(),
                glium_format(&self.format),
                name,
                false,
                glium::texture::MipmapsOption::NoMipmap,
                glium::texture::Dimensions::Texture2d {
                    width: self.width,
                    height: self.height,
                },
            )
        }
    }

    /// Release every texture that exists. Idempotent, and safe after partial
    /// construction: names are zeroed as they are deleted.
    pub fn release_all(&mut self) {
        unsafe {
            if self.input != 0 {
                gl::DeleteTextures(1, &self.input);
                self.input = 0;
            }
            if self.output != 0 {
                gl::DeleteTextures(1, &self.output);
                self.output = 0;
            }
        }
    }
}

impl Drop for TextureSet {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Format tag for glium texture wrappers.
///
/// glium only needs the tag for bookkeeping — storage was already allocated
/// through the raw path — and its float-format list has no signed-normalized
/// rows, so those map onto their unsigned cousins of the same width.
fn glium_format(format: &PixelFormat) -> glium::texture::UncompressedFloatFormat {
    use glium::texture::UncompressedFloatFormat as F;
    let bytes = format.bytes_per_channel();
    let float = matches!(format.component(), layershader_core::ComponentKind::Float);
    match (format.channels(), bytes, float) {
        (1, 1, _) => F::U8,
        (2, 1, _) => F::U8U8,
        (3, 1, _) => F::U8U8U8,
        (4, 1, _) => F::U8U8U8U8,
        (1, 2, false) => F::U16,
        (2, 2, false) => F::U16U16,
        (3, 2, false) => F::U16U16U16,
        (4, 2, false) => F::U16U16U16U16,
        (1, 2, true) => F::F16,
        (2, 2, true) => F::F16F16,
        (3, 2, true) => F::F16F16F16,
        (4, 2, true) => F::F16F16F16F16,
        (1, _, _) => F::F32,
        (2, _, _) => F::F32F32,
        (3, _, _) => F::F32F32F32,
        (_, _, _) => F::F32F32F32F32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gl_format_table() {
        let fmt = gl_format(&PixelFormat::translate("RGBA", "U8").unwrap());
        assert_eq!(
            (fmt.internal, fmt.pixel, fmt.ty),
            (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE)
        );

        let fmt = gl_format(&PixelFormat::translate("GRAYA", "U16").unwrap());
        assert_eq!(
            (fmt.internal, fmt.pixel, fmt.ty),
            (gl::RG16, gl::RG, gl::UNSIGNED_SHORT)
        );

        let fmt = gl_format(&PixelFormat::translate("A", "F32").unwrap());
        assert_eq!((fmt.internal, fmt.pixel, fmt.ty), (gl::R32F, gl::RED, gl::FLOAT));

        let fmt = gl_format(&PixelFormat::translate("RGBA", "F16").unwrap());
        assert_eq!(
            (fmt.internal, fmt.pixel, fmt.ty),
            (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT)
        );

        let fmt = gl_format(&PixelFormat::new(3, DepthCode::S8));
        assert_eq!((fmt.internal, fmt.pixel, fmt.ty), (gl::RGB8_SNORM, gl::RGB, gl::BYTE));
    }

    #[test]
    fn test_new_set_owns_nothing() {
        let format = PixelFormat::translate("RGBA", "U8").unwrap();
        let set = TextureSet::new(16, 16, format);
        assert_eq!(set.input_id(), 0);
        assert_eq!(set.output_id(), 0);
        // Dropping a never-populated set must not touch GL.
    }
}
