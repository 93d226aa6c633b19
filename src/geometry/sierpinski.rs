//! Recursive Sierpinski triangle subdivision.
//!
//! Coordinates follow canvas conventions: x grows to the right, y grows downwards,
//! and a triangle is anchored at its bottom-left corner.

use std::f32::consts::FRAC_PI_3;

use super::MeshData;

/// Deepest subdivision the sketch allows (3^8 = 6561 triangles).
pub const MAX_DEPTH: u32 = 8;

/// Fill colour `rgba(216, 112, 147, 1)`.
pub const FILL: [f32; 4] = [216.0 / 255.0, 112.0 / 255.0, 147.0 / 255.0, 1.0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle2 {
    pub a: [f32; 2],
    pub b: [f32; 2],
    pub c: [f32; 2],
}

/// Upward pointing equilateral triangle with its base from `(x, y)` to `(x + side, y)`.
pub fn equilateral(x: f32, y: f32, side: f32) -> Triangle2 {
    Triangle2 {
        a: [x, y],
        b: [x + side / 2.0, y - side * FRAC_PI_3.sin()],
        c: [x + side, y],
    }
}

pub fn triangle_count(depth: u32) -> usize {
    3usize.pow(depth)
}

/// All triangles of a Sierpinski subdivision, ordered left, top, right at every level.
pub fn subdivide(x: f32, y: f32, side: f32, depth: u32) -> Vec<Triangle2> {
    let mut triangles = Vec::with_capacity(triangle_count(depth));
    subdivide_into(x, y, side, depth, &mut triangles);
    triangles
}

fn subdivide_into(x: f32, y: f32, side: f32, depth: u32, out: &mut Vec<Triangle2>) {
    if depth == 0 {
        out.push(equilateral(x, y, side));
        return;
    }
    let half = side / 2.0;
    subdivide_into(x, y, half, depth - 1, out);
    subdivide_into(x + half / 2.0, y - half * FRAC_PI_3.sin(), half, depth - 1, out);
    subdivide_into(x + half, y, half, depth - 1, out);
}

/// Maps canvas pixels onto `[-1, 1]` (y up) with three vertices per triangle.
pub fn to_mesh(triangles: &[Triangle2], canvas_width: f32, canvas_height: f32, color: [f32; 4]) -> MeshData {
    let to_clip = |[px, py]: [f32; 2]| -> [f32; 3] {
        [
            px / canvas_width * 2.0 - 1.0,
            1.0 - py / canvas_height * 2.0,
            0.0,
        ]
    };
    let positions: Vec<[f32; 3]> = triangles
        .iter()
        // canvas y points down, so a/b/c is clockwise on screen; emit a/c/b for ccw
        .flat_map(|t| [to_clip(t.a), to_clip(t.c), to_clip(t.b)])
        .collect();
    let indices = (0..positions.len() as u32).collect();
    MeshData::new(positions, indices)
        .with_uniform_color(color)
        .compute_flat_normals()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < EPS && (a[1] - b[1]).abs() < EPS
    }

    #[test]
    fn depth_zero_is_a_single_triangle() {
        let tris = subdivide(0.0, 600.0, 600.0, 0);
        assert_eq!(tris, vec![equilateral(0.0, 600.0, 600.0)]);
        let apex = tris[0].b;
        assert!(close(apex, [300.0, 600.0 - 600.0 * (3.0f32).sqrt() / 2.0]));
    }

    #[test]
    fn depth_n_yields_three_to_the_n() {
        for depth in 0..=6 {
            assert_eq!(subdivide(0.0, 600.0, 600.0, depth).len(), 3usize.pow(depth));
            assert_eq!(triangle_count(depth), 3usize.pow(depth));
        }
    }

    #[test]
    fn first_level_follows_the_midpoint_recursion() {
        let tris = subdivide(0.0, 600.0, 600.0, 1);
        let h = 300.0 * FRAC_PI_3.sin();
        assert_eq!(tris[0], equilateral(0.0, 600.0, 300.0));
        assert_eq!(tris[1], equilateral(150.0, 600.0 - h, 300.0));
        assert_eq!(tris[2], equilateral(300.0, 600.0, 300.0));
        // sub-triangles share the parent's corners
        let parent = equilateral(0.0, 600.0, 600.0);
        assert!(close(tris[0].a, parent.a));
        assert!(close(tris[1].b, parent.b));
        assert!(close(tris[2].c, parent.c));
    }

    #[test]
    fn mesh_covers_the_canvas_in_clip_space() {
        let mesh = to_mesh(&subdivide(0.0, 600.0, 600.0, 2), 600.0, 600.0, FILL);
        assert_eq!(mesh.triangle_count(), 9);
        assert!(mesh.validate().is_ok());
        for p in &mesh.positions {
            assert!((-1.0 - EPS..=1.0 + EPS).contains(&p[0]));
            assert!((-1.0 - EPS..=1.0 + EPS).contains(&p[1]));
        }
        // the bottom-left corner of the canvas maps to (-1, -1)
        assert!(close([mesh.positions[0][0], mesh.positions[0][1]], [-1.0, -1.0]));
    }

    #[test]
    fn mesh_triangles_face_the_camera() {
        let mesh = to_mesh(&subdivide(0.0, 600.0, 600.0, 1), 600.0, 600.0, FILL);
        assert!(mesh.normals.iter().all(|n| n[2] > 0.99));
    }
}
