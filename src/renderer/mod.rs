//! WebGPU rendering module
//!
//! Uses SDF (Signed Distance Fields) for all shape rendering in the fragment shader.

pub mod sdf_pipeline;

pub use sdf_pipeline::{MAX_SHAPES, SdfRenderState};
