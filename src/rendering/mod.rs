pub mod global_uniform;
pub mod passes;
pub mod render_common;
pub mod render_mesh;
pub mod renderer;
pub(crate) mod shader_loader;
pub mod texture;
