//! Inputs from the host to the shader pipeline.

use crate::error::{Error, Result};
use crate::format::PixelFormat;

/// A borrowed view of the layer the host wants processed.
///
/// `pixels` is the layer's projection, tightly packed, top row first, in the
/// layout described by `color_model`/`color_depth`. The output buffer the
/// pipeline returns uses the same dimensions and layout.
#[derive(Debug, Clone, Copy)]
pub struct LayerInput<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub color_model: &'a str,
    pub color_depth: &'a str,
}

impl LayerInput<'_> {
    /// Derive the texture layout and check the buffer against it.
    ///
    /// Fails before any GPU work if the format codes are unrecognized, the
    /// canvas is empty, or the buffer length does not match the derived
    /// layout.
    pub fn format(&self) -> Result<PixelFormat> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Format(format!(
                "invalid canvas dimensions {}x{}",
                self.width, self.height
            )));
        }

        let format = PixelFormat::translate(self.color_model, self.color_depth)?;

        let expected = format.buffer_len(self.width, self.height);
        if self.pixels.len() != expected {
            return Err(Error::Format(format!(
                "pixel buffer is {} bytes but {}x{} {}/{} requires {expected}",
                self.pixels.len(),
                self.width,
                self.height,
                self.color_model,
                self.color_depth,
            )));
        }

        Ok(format)
    }
}
