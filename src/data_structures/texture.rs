//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helpers for depth textures, neutral normal maps, solid colours and images.
//! The CPU-side generators ([`checkerboard`], [`height_to_normal`]) only touch the
//! `image` crate so they can be tested without a device.

use anyhow::{Context as _, Result, anyhow};
use cgmath::InnerSpace;
use image::{GrayImage, ImageFormat, Rgba, RgbaImage, load_from_memory_with_format};

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Solid neutral normal map (no deformation), used when a material has no bump map.
    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
        Self::solid(device, queue, [127, 127, 255, 255], "default normal map", true)
    }

    /// 1x1 texture of a single colour. White is used for meshes that carry vertex colours.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
        is_normal_map: bool,
    ) -> Texture {
        let image = RgbaImage::from_pixel(1, 1, Rgba(rgba));
        Self::from_rgba(device, queue, &image, Some(label), is_normal_map)
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// * `format` is an optional file extension hint (e.g. "gif"). If `None`, auto-detect.
    /// * `is_normal_map` toggles between sRGB (false) and linear (true) colour space
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let img = match format {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => {
                let format = ImageFormat::from_extension(fmt)
                    .ok_or_else(|| anyhow!("Unknown image format `{fmt}` for {label}"))?;
                load_from_memory_with_format(bytes, format)?
            }
        };
        Ok(Self::from_image(device, queue, &img, Some(label), is_normal_map))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Self {
        Self::from_rgba(device, queue, &img.to_rgba8(), label, is_normal_map)
    }

    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Self {
        let dimensions = rgba.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if is_normal_map {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Loads a grayscale height map and turns it into a tangent space normal map.
    pub fn normal_map_from_height_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        strength: f32,
    ) -> Result<Self> {
        let heights = image::load_from_memory(bytes)
            .with_context(|| format!("Failed to decode height map {label}"))?
            .to_luma8();
        let normals = height_to_normal(&heights, strength);
        Ok(Self::from_rgba(device, queue, &normals, Some(label), true))
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

/// Black and white checkerboard with `squares` squares per side.
pub fn checkerboard(size: u32, squares: u32) -> RgbaImage {
    let cell = (size / squares.max(1)).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// Central differences of a height map, encoded as `n * 0.5 + 0.5` in RGB.
/// Edges clamp, so a flat map yields the neutral `(128, 128, 255)`.
pub fn height_to_normal(heights: &GrayImage, strength: f32) -> RgbaImage {
    let (w, h) = heights.dimensions();
    let sample = |x: i64, y: i64| -> f32 {
        let x = x.clamp(0, w as i64 - 1) as u32;
        let y = y.clamp(0, h as i64 - 1) as u32;
        heights.get_pixel(x, y)[0] as f32 / 255.0
    };
    RgbaImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let dx = (sample(x + 1, y) - sample(x - 1, y)) * strength;
        let dy = (sample(x, y + 1) - sample(x, y - 1)) * strength;
        let n = cgmath::Vector3::new(-dx, -dy, 1.0).normalize();
        let encode = |v: f32| ((v * 0.5 + 0.5) * 255.0).round() as u8;
        Rgba([encode(n.x), encode(n.y), encode(n.z), 255])
    })
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let board = checkerboard(64, 8);
        assert_eq!(board.dimensions(), (64, 64));
        assert_eq!(board.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(board.get_pixel(8, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(board.get_pixel(8, 8), &Rgba([255, 255, 255, 255]));
        assert_eq!(board.get_pixel(63, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn flat_height_map_is_neutral() {
        let flat = GrayImage::from_pixel(4, 4, Luma([90]));
        let normals = height_to_normal(&flat, 2.0);
        for p in normals.pixels() {
            assert_eq!(p, &Rgba([128, 128, 255, 255]));
        }
    }

    #[test]
    fn slope_tilts_normals_away_from_the_rise() {
        // height rises along +x
        let ramp = GrayImage::from_fn(8, 1, |x, _| Luma([(x * 30) as u8]));
        let normals = height_to_normal(&ramp, 4.0);
        let p = normals.get_pixel(4, 0);
        assert!(p[0] < 128, "x component should point against the slope");
        assert_eq!(p[1], 128);
        assert!(p[2] > 128);
    }
}
