use wgpu::RenderPass;

use crate::rendering::passes::render_pass_context::PassCreationContext;

pub(crate) trait Pass {
    type TextureViews;

    fn create(context: &PassCreationContext) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn render<'a, F>(
        &self,
        texture_views: &Self::TextureViews,
        encoder: &mut wgpu::CommandEncoder,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a;
}
