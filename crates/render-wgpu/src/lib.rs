//! wgpu render backend for the harness.
//!
//! One device serves every window; each window owns its surface and depth
//! buffer. The pipeline and mesh are created up front, before the first frame.
//!
//! # Invariants
//! - A frame is acquired for exactly one window at a time.
//! - Drawing requires an acquired frame; presenting consumes it.
//! - Shader validation errors surface as [`RenderError::Shader`](colorcube_render::RenderError).

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{SurfaceSource, WgpuRenderer};
pub use mesh::{MeshData, Vertex};
