use anyhow::Context;
use pollster::block_on;
use wgpu::PollType;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ShaderDefinition {
    pub name: &'static str,
    pub source: &'static str,
}

/// Builds a pipeline from an embedded shader, turning validation errors into
/// `anyhow` errors instead of device panics.
pub(crate) fn compile<T, F>(
    device: &wgpu::Device,
    shader_def: &ShaderDefinition,
    build: F,
) -> anyhow::Result<T>
where
    F: FnOnce(&wgpu::Device, &wgpu::ShaderModule) -> T,
{
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shader_def.name),
        source: wgpu::ShaderSource::Wgsl(shader_def.source.into()),
    });
    let pipeline = build(device, &shader);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation.")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        return Err(anyhow::anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    }

    log::debug!("Compiled {}", shader_def.name);
    Ok(pipeline)
}
