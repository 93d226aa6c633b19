//! Parametric primitives.
//!
//! Vertex layouts and index orders mirror the usual three.js geometry classes so that
//! sphere, plane and ring segment counts mean the same thing here. Front faces are
//! counter-clockwise, texture coordinates have v pointing down.

use std::f32::consts::{PI, TAU};

use super::MeshData;

/// Axis aligned box centred on the origin with four vertices per face.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let half = [width / 2.0, height / 2.0, depth / 2.0];
    // (normal, u, v) with u x v == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [
        (-1.0, -1.0, [0.0, 1.0]),
        (1.0, -1.0, [1.0, 1.0]),
        (1.0, 1.0, [1.0, 0.0]),
        (-1.0, 1.0, [0.0, 0.0]),
    ];

    let mut mesh = MeshData::default();
    for (normal, u, v) in faces {
        let base = mesh.positions.len() as u32;
        for (su, sv, uv) in corners {
            let p: [f32; 3] = std::array::from_fn(|i| (normal[i] + su * u[i] + sv * v[i]) * half[i]);
            mesh.positions.push(p);
            mesh.normals.push(normal);
            mesh.tex_coords.push(uv);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// UV sphere with `(width_segments + 1) * (height_segments + 1)` vertices.
/// The degenerate triangles at the poles are skipped.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut mesh = MeshData::default();
    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let normal = [
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            ];
            mesh.positions.push(normal.map(|n| n * radius));
            mesh.normals.push(normal);
            mesh.tex_coords.push([u, v]);
        }
    }
    let row = ws + 1;
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

/// Subdivided rectangle in the XY plane facing +Z. `repeat` scales the texture
/// coordinates so a repeating sampler tiles the texture that many times.
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32, repeat: f32) -> MeshData {
    let ws = width_segments.max(1);
    let hs = height_segments.max(1);
    let mut mesh = MeshData::default();
    for iy in 0..=hs {
        let y = iy as f32 * height / hs as f32 - height / 2.0;
        for ix in 0..=ws {
            let x = ix as f32 * width / ws as f32 - width / 2.0;
            mesh.positions.push([x, -y, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
            mesh.tex_coords.push([
                ix as f32 / ws as f32 * repeat,
                iy as f32 / hs as f32 * repeat,
            ]);
        }
    }
    let row = ws + 1;
    for iy in 0..hs {
        for ix in 0..ws {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = ix + 1 + row * (iy + 1);
            let d = ix + 1 + row * iy;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

/// Flat annulus in the XY plane.
pub fn ring(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> MeshData {
    let segments = theta_segments.max(3);
    let mut mesh = MeshData::default();
    for radius in [inner_radius, outer_radius] {
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (x, y) = (radius * angle.cos(), radius * angle.sin());
            mesh.positions.push([x, y, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
            mesh.tex_coords.push([
                (x / outer_radius + 1.0) / 2.0,
                1.0 - (y / outer_radius + 1.0) / 2.0,
            ]);
        }
    }
    for i in 0..segments {
        let a = i;
        let b = i + segments + 1;
        let c = i + segments + 2;
        let d = i + 1;
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }
    mesh
}

/// Closed circle in the XZ plane as a line strip of `points + 1` vertices.
pub fn circle_outline(radius: f32, points: u32) -> MeshData {
    let points = points.max(3);
    let positions: Vec<[f32; 3]> = (0..=points)
        .map(|i| {
            let angle = i as f32 / points as f32 * TAU;
            [radius * angle.cos(), 0.0, -radius * angle.sin()]
        })
        .collect();
    let indices = (0..positions.len() as u32).collect();
    MeshData::new(positions, indices)
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn box_has_outward_ccw_faces() {
        let mesh = cuboid(0.8, 2.0, 0.8);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.validate().is_ok());
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(mesh.positions[i as usize]));
            let n = (b - a).cross(c - a).normalize();
            let expected = Vector3::from(mesh.normals[tri[0] as usize]);
            assert!((n - expected).magnitude() < 1e-5);
        }
        let max = mesh.positions.iter().fold([f32::MIN; 3], |m, p| std::array::from_fn(|i| m[i].max(p[i])));
        assert_eq!(max, [0.4, 1.0, 0.4]);
    }

    #[test]
    fn sphere_counts_match_segments() {
        let mesh = uv_sphere(3.0, 28, 14);
        assert_eq!(mesh.vertex_count(), 29 * 15);
        assert_eq!(mesh.triangle_count(), 28 * (2 * 14 - 2));
        assert!(mesh.validate().is_ok());
        for p in &mesh.positions {
            assert!((Vector3::from(*p).magnitude() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_triangles_face_outwards() {
        let mesh = uv_sphere(1.0, 16, 8);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(mesh.positions[i as usize]));
            let n = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn plane_repeats_texture_coordinates() {
        let mesh = plane(1000.0, 1000.0, 50, 50, 10.0);
        assert_eq!(mesh.vertex_count(), 51 * 51);
        assert_eq!(mesh.triangle_count(), 50 * 50 * 2);
        assert!(mesh.validate().is_ok());
        let max_u = mesh.tex_coords.iter().map(|t| t[0]).fold(0.0, f32::max);
        assert!((max_u - 10.0).abs() < 1e-5);
    }

    #[test]
    fn ring_spans_inner_to_outer_radius() {
        let mesh = ring(2.5, 3.0, 64);
        assert_eq!(mesh.vertex_count(), 130);
        assert_eq!(mesh.triangle_count(), 128);
        assert!(mesh.validate().is_ok());
        for p in &mesh.positions {
            let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
            assert!(r > 2.5 - 1e-4 && r < 3.0 + 1e-4);
        }
    }

    #[test]
    fn circle_outline_is_closed() {
        let mesh = circle_outline(20.0, 128);
        assert_eq!(mesh.vertex_count(), 129);
        let first = mesh.positions[0];
        let last = mesh.positions[128];
        assert!((first[0] - last[0]).abs() < 1e-3 && (first[2] - last[2]).abs() < 1e-3);
        assert!(mesh.positions.iter().all(|p| p[1] == 0.0));
    }
}
