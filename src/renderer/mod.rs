//! WebGPU rendering module
//!
//! The scene is tessellated on the CPU into flat-colored triangles in
//! viewport pixels; the pipeline maps them to NDC and draws one list per frame.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderError, RenderState};
pub use scene::{boss_scene, run_scene};
pub use vertex::{Vertex, colors};
