use std::sync::Arc;

use crate::rendering::render_common::RenderCommon;

pub struct PassCreationContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub common: Arc<RenderCommon>,
}
