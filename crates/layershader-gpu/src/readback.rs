//! Output texture readback.

use layershader_core::{Error, Result};
use layershader_glium::GlSession;

use crate::textures::{gl_format, TextureSet};
use crate::validate::{clear_gl_errors, drain_gl_errors};

/// Read the output texture into a tightly packed pixel buffer.
///
/// The result is sized exactly `width * height * channels *
/// bytes_per_channel`, matching the host's layer layout. Only valid after a
/// completed dispatch or draw.
pub fn read_output(_session: &GlSession<'_>, textures: &TextureSet) -> Result<Vec<u8>> {
    let format = textures.format();
    let len = format.buffer_len(textures.width(), textures.height());
    let mut pixels = vec![0u8; len];
    let fmt = gl_format(&format);

    clear_gl_errors();
    unsafe {
        gl::BindTexture(gl::TEXTURE_2D, textures.output_id());
        gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
        gl::GetTexImage(
            gl::TEXTURE_2D,
            0,
            fmt.pixel,
            fmt.ty,
            pixels.as_mut_ptr().cast(),
        );
        gl::BindTexture(gl::TEXTURE_2D, 0);
    }

    if let Some(errors) = drain_gl_errors() {
        return Err(Error::Runtime(format!("readback raised {errors}")));
    }

    Ok(pixels)
}
