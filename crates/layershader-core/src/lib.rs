//! Host-boundary types for the layershader pipeline.
//!
//! This crate carries everything the GPU execution crates and the host agree
//! on without touching OpenGL: pixel format translation, execution parameter
//! parsing, the primitive topology table, and the error taxonomy shared
//! across the stack.
//!
//! - [`PixelFormat`] turns host color-model/depth codes into a texture layout.
//! - [`ComputeRequest`] / [`RasterRequest`] hold execution parameters, with
//!   recoverable parsing of host-supplied text fields.
//! - [`LayerInput`] is the borrowed view over the host's pixel buffer.
//! - [`Error`] is the per-stage failure taxonomy; its `Display` text is the
//!   diagnostic hosts show the user verbatim.

pub mod error;
pub mod format;
pub mod input;
pub mod params;

pub use error::{Error, ParameterError, Result};
pub use format::{ComponentKind, DepthCode, PixelFormat};
pub use input::LayerInput;
pub use params::{ComputeRequest, RasterRequest, Topology};
