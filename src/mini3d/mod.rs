//! Minimal fixed-pipeline 3D renderer for the 1-bit framebuffer
//!
//! Transform, backface cull, painter's sort, then scanline fill with one of
//! 33 ordered-dither patterns and optional black wireframe edges.

pub mod raster;
pub mod scene;
pub mod shape;

pub use scene::{DrawStats, RenderStyle, Scene};
pub use shape::{Mesh, MeshError, Shape};
