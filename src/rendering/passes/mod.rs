pub mod overlay_pass;
pub(crate) mod pass;
pub mod render_pass_context;
pub mod scene_pass;
