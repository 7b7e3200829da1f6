//! Pixel format translation from host color descriptors.
//!
//! Hosts describe a layer with two strings: a color model code (`"RGBA"`,
//! `"GRAYA"`, ...) and a depth code (`"U8"`, `"F32"`, ...). [`PixelFormat`]
//! derives the texture layout from that pair once per invocation.

use crate::error::{Error, Result};

/// How a channel's bits are interpreted on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// IEEE float (16 or 32 bit).
    Float,
    /// Unsigned integer normalized to [0, 1].
    UnsignedNorm,
    /// Signed integer normalized to [-1, 1].
    SignedNorm,
}

/// Recognized depth codes.
///
/// Each row of the table fixes the component kind and channel width, so a
/// depth is either fully supported or rejected up front — there is no
/// partial parse of the host string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCode {
    U8,
    U16,
    S8,
    S16,
    F16,
    F32,
}

impl DepthCode {
    /// Look up a host depth string. Matching is exact apart from ASCII case.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "U8" => Some(Self::U8),
            "U16" => Some(Self::U16),
            "S8" => Some(Self::S8),
            "S16" => Some(Self::S16),
            "F16" => Some(Self::F16),
            "F32" => Some(Self::F32),
            _ => None,
        }
    }

    /// Component interpretation for this depth.
    pub fn component(self) -> ComponentKind {
        match self {
            Self::F16 | Self::F32 => ComponentKind::Float,
            Self::U8 | Self::U16 => ComponentKind::UnsignedNorm,
            Self::S8 | Self::S16 => ComponentKind::SignedNorm,
        }
    }

    /// Storage width of one channel in bytes.
    pub fn bytes_per_channel(self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Texture layout derived from a host color model + depth pair.
///
/// Immutable once derived; both the input and the output texture of an
/// invocation use the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    channels: u8,
    depth: DepthCode,
}

impl PixelFormat {
    /// Translate host codes into a texture layout.
    ///
    /// The channel count is the number of ASCII-uppercase letters in the
    /// model code. The gray+alpha model `"GRAYA"` is the one exception: it
    /// names two channels, not five. Counts outside 1..=4 (e.g. `"CMYKA"`)
    /// have no GPU texture shape and are rejected here, before anything is
    /// allocated.
    pub fn translate(color_model: &str, color_depth: &str) -> Result<Self> {
        let model = color_model.trim();
        let channels = if model.eq_ignore_ascii_case("GRAYA") {
            2
        } else {
            model.chars().filter(|c| c.is_ascii_uppercase()).count()
        };

        if !(1..=4).contains(&channels) {
            return Err(Error::Format(format!(
                "color model {model:?} maps to {channels} channels; textures support 1 to 4"
            )));
        }

        let depth = DepthCode::parse(color_depth).ok_or_else(|| {
            Error::Format(format!("unrecognized color depth code {color_depth:?}"))
        })?;

        Ok(Self {
            channels: channels as u8,
            depth,
        })
    }

    /// Construct directly from parts. Panics if `channels` is outside 1..=4.
    pub fn new(channels: u8, depth: DepthCode) -> Self {
        assert!((1..=4).contains(&channels), "channels must be 1..=4");
        Self { channels, depth }
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn depth(&self) -> DepthCode {
        self.depth
    }

    pub fn component(&self) -> ComponentKind {
        self.depth.component()
    }

    pub fn bytes_per_channel(&self) -> usize {
        self.depth.bytes_per_channel()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.channels as usize * self.bytes_per_channel()
    }

    /// Exact byte length of a tightly packed `width` x `height` buffer in
    /// this format.
    pub fn buffer_len(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}
