//! GPU execution of user-authored shaders against host raster layers.
//!
//! This crate ties together [`layershader_core`] (host boundary types) and
//! [`layershader_glium`] (the shared OpenGL context) into the execution
//! pipeline itself:
//!
//! - [`TextureSet`] allocates the input and output textures for one
//!   invocation and guarantees their release.
//! - [`ShaderProgram`] compiles a user compute kernel or vertex+fragment
//!   pair, surfacing the driver's diagnostics verbatim.
//! - [`ComputeDispatcher`] / [`RasterDispatcher`] encapsulate the two
//!   invocation protocols (dispatch vs. draw).
//! - [`read_output`] copies the finished output texture back into a
//!   host-shaped pixel buffer.
//! - [`run_compute`] / [`run_raster`] are the entry points hosts call: one
//!   complete, synchronous invocation per call.
//!
//! # Binding contract
//!
//! User shader source must match the fixed resource slots:
//!
//! - Compute: output image at unit 0 (read+write), input image at unit 1
//!   (read-only).
//! - Raster: the output texture is the sole color attachment; every
//!   `sampler2D` uniform the program declares receives the input layer.

pub mod dispatch;
pub mod program;
pub mod readback;
pub mod run;
pub mod textures;
mod validate;

pub use dispatch::{ComputeDispatcher, DispatchState, RasterDispatcher};
pub use program::ShaderProgram;
pub use readback::read_output;
pub use run::{run_compute, run_raster};
pub use textures::TextureSet;
