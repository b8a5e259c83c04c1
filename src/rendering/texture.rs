use wgpu::util::DeviceExt;

use crate::prop_image::PropImage;

pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
}

impl Texture {
    pub fn from_wgpu_texture(
        texture: wgpu::Texture,
        device: &wgpu::Device,
        compare: Option<wgpu::CompareFunction>,
    ) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare,
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }

    /// Uploads the prop image, or a single white texel when there is none.
    pub fn from_prop_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: Option<&PropImage>,
    ) -> Self {
        const WHITE: [u8; 4] = [255, 255, 255, 255];

        let max_dimension = device.limits().max_texture_dimension_2d;
        let fitted = image.and_then(|image| match image.fit_within(max_dimension) {
            Ok(fitted) => Some(fitted),
            Err(error) => {
                log::warn!("{:#}, using the default prop texture", error);
                None
            }
        });

        let (label, width, height, pixels) = match fitted.as_deref() {
            Some(image) => (
                image.name.as_str(),
                image.width,
                image.height,
                image.pixels.as_slice(),
            ),
            None => ("Default prop texture", 1, 1, WHITE.as_slice()),
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::wgt::TextureDataOrder::default(),
            pixels,
        );

        Self::from_wgpu_texture(texture, device, None)
    }
}

pub struct DepthTexture {
    texture: Texture,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: impl Into<String>,
    ) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, config, &label);

        DepthTexture {
            texture: Texture::from_wgpu_texture(
                texture,
                device,
                Some(wgpu::CompareFunction::LessEqual),
            ),
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };

        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        self.texture = Texture::from_wgpu_texture(
            Self::create_wgpu_texture(device, config, &self.label),
            device,
            Some(wgpu::CompareFunction::LessEqual),
        );
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }
}
