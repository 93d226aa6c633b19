use crate::{
    data_structures::{model, texture},
    resources::load_binary,
};

/// Group 0 of the model pipelines: diffuse texture and sampler, normal map and sampler.
pub fn diffuse_normal_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Model texture_bind_group_layout"),
    })
}

pub async fn load_texture(
    file_name: &str,
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, format, is_normal_map)
}

/// Loads `file_name` or, if that fails, returns a 1x1 texture of `fallback`.
pub async fn load_texture_or(
    file_name: &str,
    fallback: [u8; 4],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> texture::Texture {
    match load_texture(file_name, false, device, queue, None).await {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("Using a solid colour instead of {file_name}: {e}");
            texture::Texture::solid(device, queue, fallback, file_name, false)
        }
    }
}

/// Turns a grayscale bump map into a normal map. Falls back to the flat default.
pub async fn load_bump_map(
    file_name: &str,
    strength: f32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> texture::Texture {
    let converted = match load_binary(file_name).await {
        Ok(bytes) => {
            texture::Texture::normal_map_from_height_bytes(device, queue, &bytes, file_name, strength)
        }
        Err(e) => Err(e),
    };
    converted.unwrap_or_else(|e| {
        log::warn!("Bump map {file_name} skipped: {e}");
        texture::Texture::create_default_normal_map(device, queue)
    })
}

/// White diffuse and flat normal map, for meshes that carry their colour per vertex.
pub fn default_material(device: &wgpu::Device, queue: &wgpu::Queue, name: &str) -> model::Material {
    let diffuse = texture::Texture::solid(device, queue, [255; 4], name, false);
    let normal = texture::Texture::create_default_normal_map(device, queue);
    model::Material::new(device, name, diffuse, normal, &diffuse_normal_layout(device))
}

/// Material with `diffuse` and an optional normal map.
pub fn material_from_textures(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    diffuse: texture::Texture,
    normal: Option<texture::Texture>,
) -> model::Material {
    let normal = normal.unwrap_or_else(|| texture::Texture::create_default_normal_map(device, queue));
    model::Material::new(device, name, diffuse, normal, &diffuse_normal_layout(device))
}

/// Materials of an `.obj` file. Textures are resolved relative to the model; missing
/// textures degrade to white instead of dropping the material so mesh indices stay valid.
pub async fn load_materials(
    file_name: &str,
    obj_materials: &[tobj::Material],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> Vec<model::Material> {
    let mut materials = Vec::with_capacity(obj_materials.len());
    for m in obj_materials {
        let diffuse_texture = match &m.diffuse_texture {
            Some(diffuse) => {
                load_texture_or(&super::sibling(file_name, diffuse), [255; 4], device, queue).await
            }
            None => {
                log::warn!("Material {} of {file_name} references no texture.", m.name);
                texture::Texture::solid(device, queue, [255; 4], &m.name, false)
            }
        };
        let normal_texture = match &m.normal_texture {
            Some(normal) => {
                match load_texture(&super::sibling(file_name, normal), true, device, queue, None)
                    .await
                {
                    Ok(texture) => texture,
                    Err(e) => {
                        log::warn!("Normal map {normal} skipped: {e}");
                        texture::Texture::create_default_normal_map(device, queue)
                    }
                }
            }
            None => texture::Texture::create_default_normal_map(device, queue),
        };
        materials.push(model::Material::new(
            device,
            &m.name,
            diffuse_texture,
            normal_texture,
            layout,
        ));
    }
    materials
}
