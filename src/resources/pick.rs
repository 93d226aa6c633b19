use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Group 0 of the pick pipeline: the base id of the drawn model.
pub fn pick_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("pick_bind_group_layout"),
    })
}

/// Uniform contents for `id`. Browsers reject uniform buffers below 16 bytes, so the id
/// is padded to a full `vec4<u32>`.
pub fn pick_uniform(id: u32) -> [u32; 4] {
    [id, 0, 0, 0]
}

/**
 * A material that carries a uniform ID instead of textures. The pick shader writes
 * `id + instance_index` to the ID target, which makes picking pixel-perfect.
 */
pub fn load_pick_material(device: &wgpu::Device, id: u32) -> model::Material {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Pick id buffer"),
        contents: bytemuck::cast_slice(&pick_uniform(id)),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    model::Material::new_pick_material(device, "Pick Material", &pick_layout(device), buffer)
}
