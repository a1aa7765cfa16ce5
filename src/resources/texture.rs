use std::path::Path;

use anyhow::Context as _;

use crate::resources::{Resource, ResourceInfo, ResourceType};

/// A decoded RGBA8 image.
///
/// The pixels stay on the CPU; [`create_gpu_texture`](Self::create_gpu_texture)
/// uploads them when a renderer needs them.
#[derive(Clone, Debug, Default)]
pub struct Texture {
    info: ResourceInfo,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    is_normal_map: bool,
}

impl Texture {
    /// A `width` x `height` texture filled with `color`.
    pub fn solid(name: &str, width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .cycle()
            .take(width as usize * height as usize * 4)
            .copied()
            .collect();
        Self {
            info: ResourceInfo::new(name),
            width,
            height,
            rgba,
            is_normal_map: false,
        }
    }

    /// The blue/purple-ish colour that represents "no deformation".
    pub fn default_normal_map(width: u32, height: u32) -> Self {
        Self {
            is_normal_map: true,
            ..Self::solid("default normal map", width, height, [127, 127, 255, 255])
        }
    }

    /// Decodes image file contents (PNG, JPEG, ...).
    pub fn from_bytes(name: &str, bytes: &[u8], is_normal_map: bool) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes).context("Unsupported image data")?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            info: ResourceInfo::new(name),
            width,
            height,
            rgba: rgba.into_raw(),
            is_normal_map,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn is_normal_map(&self) -> bool {
        self.is_normal_map
    }

    pub fn set_normal_map(&mut self, is_normal_map: bool) {
        self.is_normal_map = is_normal_map;
    }

    /// Normal maps hold vectors, not colours, so they must not be sRGB decoded.
    pub fn format(&self) -> wgpu::TextureFormat {
        if self.is_normal_map {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        }
    }

    pub fn create_gpu_texture(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: self.width.max(1),
            height: self.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.info.name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if !self.rgba.is_empty() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                &self.rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * self.width),
                    rows_per_image: Some(self.height),
                },
                size,
            );
        }
        texture
    }
}

impl Resource for Texture {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ResourceInfo {
        &mut self.info
    }

    fn static_type() -> ResourceType {
        ResourceType::Texture
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Texture
    }

    fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let img = image::open(path)
            .with_context(|| format!("Failed to decode image {}", path.display()))?;
        let rgba = img.to_rgba8();
        (self.width, self.height) = rgba.dimensions();
        self.rgba = rgba.into_raw();
        Ok(())
    }

    fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        image::save_buffer(
            path,
            &self.rgba,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("Failed to write image {}", path.display()))
    }
}
