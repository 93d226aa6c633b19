use cgmath::{Vector2, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::model::{self, ModelVertex},
    geometry::MeshData,
};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Expands the attribute arrays of `data` into GPU vertices. Missing attributes
/// become zero normals, zero texture coordinates and white.
pub fn to_vertices(data: &MeshData) -> Vec<ModelVertex> {
    data.positions
        .iter()
        .enumerate()
        .map(|(i, position)| ModelVertex {
            position: *position,
            tex_coords: data.tex_coords.get(i).copied().unwrap_or_default(),
            normal: data.normals.get(i).copied().unwrap_or_default(),
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            color: data.colors.get(i).copied().unwrap_or(WHITE),
        })
        .collect()
}

/**
 * Neither `.obj` files nor the procedural meshes come with tangents and bitangents, so
 * they are derived from the texture coordinates for normal maps to work.
 *
 * Triangles whose UVs are degenerate contribute nothing. Vertices without any
 * contribution keep zero tangents, which the lit shader treats as "no normal map".
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let pos0: Vector3<_> = v0.position.into();
        let pos1: Vector3<_> = v1.position.into();
        let pos2: Vector3<_> = v2.position.into();

        let uv0: Vector2<_> = v0.tex_coords.into();
        let uv1: Vector2<_> = v1.tex_coords.into();
        let uv2: Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        // delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped for right-handed normal maps in wgpu texture space
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            let v = &mut vertices[i];
            v.tangent = (tangent + Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + Vector3::from(v.bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (Vector3::from(v.tangent) * denom).into();
        v.bitangent = (Vector3::from(v.bitangent) * denom).into();
    }
}

fn create_mesh(
    device: &wgpu::Device,
    name: &str,
    vertices: &[ModelVertex],
    indices: &[u32],
    material: usize,
) -> model::Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name:?} Vertex Buffer")),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name:?} Index Buffer")),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
        material,
    }
}

/// Uploads procedural geometry. Tangents are only derived when the mesh has UVs.
pub fn upload_mesh(device: &wgpu::Device, data: &MeshData, name: &str) -> model::Mesh {
    let mut vertices = to_vertices(data);
    if !data.tex_coords.is_empty() {
        compute_tangents(&mut vertices, &data.indices);
    }
    create_mesh(device, name, &vertices, &data.indices, 0)
}

/// A single-mesh model drawn with `material`.
pub fn model_from_mesh(
    device: &wgpu::Device,
    data: &MeshData,
    name: &str,
    material: model::Material,
) -> model::Model {
    model::Model {
        meshes: vec![upload_mesh(device, data, name)],
        materials: vec![material],
    }
}

/// Meshes of a parsed `.obj` file. Meshes whose indices overflow are skipped.
pub fn load_meshes(models: &[tobj::Model], file_name: &str, device: &wgpu::Device) -> Vec<model::Mesh> {
    models
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| {
            let vertex_count = m.mesh.positions.len() / 3;
            if m.mesh.indices.iter().any(|&i| i as usize >= vertex_count) {
                log::warn!(
                    "Mesh at index {idx} in file {file_name} has out of range indices and is skipped."
                );
                return None;
            }
            let mut vertices = (0..vertex_count)
                .map(|i| ModelVertex {
                    position: [
                        m.mesh.positions[i * 3],
                        m.mesh.positions[i * 3 + 1],
                        m.mesh.positions[i * 3 + 2],
                    ],
                    tex_coords: [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    normal: [
                        m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                    tangent: [0.0; 3],
                    bitangent: [0.0; 3],
                    color: WHITE,
                })
                .collect::<Vec<_>>();
            compute_tangents(&mut vertices, &m.mesh.indices);
            Some(create_mesh(
                device,
                file_name,
                &vertices,
                &m.mesh.indices,
                m.mesh.material_id.unwrap_or(0),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [2.0, 2.0, 0.0],
                [0.0, 2.0, 0.0],
            ],
            tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Default::default()
        }
    }

    #[test]
    fn missing_attributes_get_defaults() {
        let data = MeshData::new(vec![[1.0, 2.0, 3.0]], vec![]);
        let v = to_vertices(&data);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(v[0].color, WHITE);
        assert_eq!(v[0].normal, [0.0; 3]);
    }

    #[test]
    fn tangents_follow_the_u_axis() {
        let data = quad();
        let mut v = to_vertices(&data);
        compute_tangents(&mut v, &data.indices);
        for vertex in &v {
            let t = Vector3::from(vertex.tangent);
            assert!((t.x - 2.0).abs() < 1e-5 && t.y.abs() < 1e-5, "{t:?}");
        }
    }

    #[test]
    fn degenerate_uvs_leave_tangents_zero() {
        let mut data = quad();
        data.tex_coords = vec![[0.0, 0.0]; 4];
        let mut v = to_vertices(&data);
        compute_tangents(&mut v, &data.indices);
        assert!(v.iter().all(|v| v.tangent == [0.0; 3] && v.bitangent == [0.0; 3]));
    }
}
