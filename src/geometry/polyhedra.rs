//! Hand-authored polyhedra.
//!
//! Each shape lists its faces as runs of consecutive vertices so that every face can
//! carry its own flat colour. The index lists triangulate those runs.

use super::{GeometryError, MeshData};

/// Positions, triangle indices and the number of vertices belonging to each face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub face_sizes: Vec<usize>,
}

impl FaceMesh {
    pub fn face_count(&self) -> usize {
        self.face_sizes.len()
    }

    /// Expands one colour per face into per-vertex colours and validates the result.
    pub fn into_mesh(self, face_colors: &[[f32; 4]]) -> Result<MeshData, GeometryError> {
        let mesh = MeshData::new(self.positions, self.indices)
            .with_face_colors(&self.face_sizes, face_colors)?
            .compute_flat_normals();
        mesh.validate()?;
        Ok(mesh)
    }
}

#[rustfmt::skip]
const SCUTOID_POSITIONS: [[f32; 3]; 36] = [
    // hexagon
    [-1.0, 0.0, 1.5], [-0.5, -0.87, 1.5], [0.5, -0.87, 1.5],
    [1.0, 0.0, 1.5], [0.5, 0.87, 1.5], [-0.5, 0.87, 1.5],
    // pentagon
    [-1.0, 0.0, -1.5], [-0.31, -0.95, -1.5], [0.81, -0.59, -1.5],
    [0.81, 0.59, -1.5], [-0.31, 0.95, -1.5],
    // side 1
    [-1.0, 0.0, 1.5], [-0.5, -0.87, 1.5], [-1.0, 0.0, -1.5], [-0.31, -0.95, -1.5],
    // side 2
    [-0.5, -0.87, 1.5], [0.5, -0.87, 1.5], [-0.31, -0.95, -1.5], [0.81, -0.59, -1.5],
    // side 3
    [0.5, -0.87, 1.5], [1.0, 0.0, 1.5], [0.81, -0.59, -1.5], [0.81, 0.59, -1.5],
    [0.81, 0.59, 0.0],
    // the triangle that makes it a scutoid
    [1.0, 0.0, 1.5], [0.5, 0.87, 1.5], [0.81, 0.59, 0.0],
    // side 4
    [0.5, 0.87, 1.5], [-0.5, 0.87, 1.5], [0.81, 0.59, -1.5], [-0.31, 0.95, -1.5],
    [0.81, 0.59, 0.0],
    // side 5
    [-0.5, 0.87, 1.5], [-1.0, 0.0, 1.5], [-0.31, 0.95, -1.5], [-1.0, 0.0, -1.5],
];

#[rustfmt::skip]
const SCUTOID_INDICES: [u32; 60] = [
    0, 1, 2,    0, 5, 2,    3, 2, 5,    4, 5, 3,
    6, 7, 8,    8, 10, 6,   8, 9, 10,
    11, 12, 13, 12, 13, 14,
    15, 16, 17, 18, 16, 17,
    19, 20, 21, 22, 20, 21, 20, 22, 23,
    24, 25, 26,
    27, 28, 29, 28, 29, 30, 27, 29, 31,
    32, 33, 34, 33, 34, 35,
];

const SCUTOID_FACES: [usize; 8] = [6, 5, 4, 4, 5, 3, 5, 4];

/// Prism-like solid with a hexagon on one end, a pentagon on the other and a
/// triangular face where a side edge splits.
pub fn scutoid() -> FaceMesh {
    FaceMesh {
        positions: SCUTOID_POSITIONS.to_vec(),
        indices: SCUTOID_INDICES.to_vec(),
        face_sizes: SCUTOID_FACES.to_vec(),
    }
}

#[rustfmt::skip]
const DODECAHEDRON_POSITIONS: [[f32; 3]; 60] = [
    [0.8, 0.8, 0.8], [0.8, 0.8, -0.8], [0.5, 1.3, 0.0], [1.3, 0.0, 0.5], [1.3, 0.0, -0.5],
    [0.8, 0.8, 0.8], [0.8, -0.8, 0.8], [0.0, 0.5, 1.3], [0.0, -0.5, 1.3], [1.3, 0.0, 0.5],
    [0.8, -0.8, 0.8], [0.8, -0.8, -0.8], [0.5, -1.3, 0.0], [1.3, 0.0, 0.5], [1.3, 0.0, -0.5],
    [0.8, 0.8, -0.8], [0.8, -0.8, -0.8], [0.0, 0.5, -1.3], [0.0, -0.5, -1.3], [1.3, 0.0, -0.5],
    [0.8, 0.8, -0.8], [-0.8, 0.8, -0.8], [0.0, 0.5, -1.3], [0.5, 1.3, 0.0], [-0.5, 1.3, 0.0],
    [0.8, 0.8, 0.8], [-0.8, 0.8, 0.8], [0.0, 0.5, 1.3], [0.5, 1.3, 0.0], [-0.5, 1.3, 0.0],
    [-0.8, 0.8, 0.8], [-0.8, -0.8, 0.8], [0.0, 0.5, 1.3], [0.0, -0.5, 1.3], [-1.3, 0.0, 0.5],
    [0.8, -0.8, 0.8], [-0.8, -0.8, 0.8], [0.0, -0.5, 1.3], [0.5, -1.3, 0.0], [-0.5, -1.3, 0.0],
    [0.8, -0.8, -0.8], [-0.8, -0.8, -0.8], [0.0, -0.5, -1.3], [0.5, -1.3, 0.0], [-0.5, -1.3, 0.0],
    [-0.8, 0.8, -0.8], [-0.8, -0.8, -0.8], [0.0, 0.5, -1.3], [0.0, -0.5, -1.3], [-1.3, 0.0, -0.5],
    [-0.8, 0.8, 0.8], [-0.8, 0.8, -0.8], [-0.5, 1.3, 0.0], [-1.3, 0.0, 0.5], [-1.3, 0.0, -0.5],
    [-0.8, -0.8, 0.8], [-0.8, -0.8, -0.8], [-0.5, -1.3, 0.0], [-1.3, 0.0, 0.5], [-1.3, 0.0, -0.5],
];

#[rustfmt::skip]
const DODECAHEDRON_INDICES: [u32; 108] = [
    3, 4, 1,    3, 1, 2,    3, 2, 0,
    8, 9, 6,    9, 8, 7,    9, 7, 5,
    10, 12, 11, 10, 11, 14, 10, 14, 13,
    17, 18, 16, 15, 17, 16, 19, 16, 15,
    23, 24, 20, 24, 20, 22, 24, 22, 21,
    27, 25, 28, 27, 28, 29, 27, 29, 26,
    33, 31, 34, 33, 34, 30, 33, 30, 32,
    38, 39, 36, 38, 36, 37, 38, 37, 35,
    42, 41, 44, 42, 44, 43, 42, 43, 40,
    45, 49, 46, 45, 46, 48, 45, 48, 47,
    50, 53, 54, 50, 54, 51, 50, 51, 52,
    57, 56, 59, 57, 59, 58, 58, 55, 57,
];

/// Twelve pentagons, each fanned into three triangles.
pub fn dodecahedron() -> FaceMesh {
    FaceMesh {
        positions: DODECAHEDRON_POSITIONS.to_vec(),
        indices: DODECAHEDRON_INDICES.to_vec(),
        face_sizes: vec![5; 12],
    }
}

/// Eight triangles around the axes at distance 0.9.
pub fn octahedron() -> FaceMesh {
    const R: f32 = 0.9;
    let faces: [[[f32; 3]; 3]; 8] = [
        [[-R, 0.0, 0.0], [0.0, -R, 0.0], [0.0, 0.0, R]],
        [[-R, 0.0, 0.0], [0.0, R, 0.0], [0.0, 0.0, R]],
        [[R, 0.0, 0.0], [0.0, R, 0.0], [0.0, 0.0, R]],
        [[R, 0.0, 0.0], [0.0, -R, 0.0], [0.0, 0.0, R]],
        [[R, 0.0, 0.0], [0.0, -R, 0.0], [0.0, 0.0, -R]],
        [[-R, 0.0, 0.0], [0.0, -R, 0.0], [0.0, 0.0, -R]],
        [[-R, 0.0, 0.0], [0.0, R, 0.0], [0.0, 0.0, -R]],
        [[R, 0.0, 0.0], [0.0, R, 0.0], [0.0, 0.0, -R]],
    ];
    let positions: Vec<[f32; 3]> = faces.into_iter().flatten().collect();
    FaceMesh {
        indices: (0..positions.len() as u32).collect(),
        positions,
        face_sizes: vec![3; 8],
    }
}

// Coordinates in thirds of a unit; `sierpinski_pyramid` scales them down.
#[rustfmt::skip]
const PYRAMID_THIRDS: [[f32; 3]; 108] = [
    // first face
    [-3.0, 0.58, 1.63], [-4.0, 0.0, 0.0], [-2.0, 0.0, 0.0],
    [-1.0, 0.58, 1.63], [-2.0, 0.0, 0.0], [0.0, 0.0, 0.0],
    [-2.0, 1.15, 3.27], [-3.0, 0.58, 1.63], [-1.0, 0.58, 1.63],
    [1.0, 0.58, 1.63], [2.0, 0.0, 0.0], [0.0, 0.0, 0.0],
    [3.0, 0.58, 1.63], [4.0, 0.0, 0.0], [2.0, 0.0, 0.0],
    [2.0, 1.15, 3.27], [3.0, 0.58, 1.63], [1.0, 0.58, 1.63],
    [-2.0, 1.15, 3.27], [0.0, 1.15, 3.27], [-1.0, 1.73, 4.9],
    [2.0, 1.15, 3.27], [0.0, 1.15, 3.27], [1.0, 1.73, 4.9],
    [0.0, 2.31, 6.53], [-1.0, 1.73, 4.9], [1.0, 1.73, 4.9],
    // second face
    [4.0, 0.0, 0.0], [3.0, 0.58, 1.63], [3.0, 1.73, 0.0],
    [2.0, 2.31, 1.63], [3.0, 1.73, 0.0], [2.0, 3.46, 0.0],
    [2.0, 1.15, 3.27], [3.0, 0.58, 1.63], [2.0, 2.32, 1.63],
    [1.02, 4.03, 1.6], [2.0, 3.46, 0.0], [1.0, 5.2, 0.0],
    [0.0, 5.77, 1.63], [1.0, 5.2, 0.0], [0.0, 6.93, 0.0],
    [0.0, 5.77, 1.63], [0.02, 4.58, 3.27], [1.02, 4.03, 1.6],
    [1.0, 1.73, 4.9], [2.0, 1.15, 3.27], [1.0, 2.89, 3.27],
    [0.0, 3.46, 4.9], [1.0, 2.89, 3.27], [0.0, 4.62, 3.27],
    [0.0, 2.31, 6.53], [1.0, 1.73, 4.9], [0.0, 3.46, 4.9],
    // third face
    [0.0, 6.93, 0.0], [0.0, 5.77, 1.63], [-1.0, 5.2, 0.0],
    [-1.0, 5.2, 0.0], [-1.0, 4.04, 1.63], [-2.0, 3.46, 0.0],
    [-1.0, 4.04, 1.63], [0.0, 5.77, 1.63], [0.02, 4.58, 3.27],
    [-2.0, 2.31, 1.63], [-2.0, 3.46, 0.0], [-3.0, 1.73, 0.0],
    [-4.0, 0.0, 0.0], [-3.0, 0.58, 1.63], [-3.0, 1.73, 0.0],
    [-3.0, 0.58, 1.63], [-2.0, 2.31, 1.63], [-2.0, 1.15, 3.27],
    [0.0, 4.62, 3.27], [-1.0, 2.89, 3.27], [0.0, 3.46, 4.9],
    [-1.0, 2.89, 3.27], [-2.0, 1.15, 3.27], [-1.0, 1.73, 4.9],
    [0.0, 3.46, 4.9], [-1.0, 1.73, 4.9], [0.0, 2.31, 6.53],
    // base
    [3.0, 1.73, 0.0], [2.0, 0.0, 0.0], [4.0, 0.0, 0.0],
    [2.0, 0.0, 0.0], [1.0, 1.73, 0.0], [0.0, 0.0, 0.0],
    [1.0, 1.73, 0.0], [2.0, 3.46, 0.0], [3.0, 1.73, 0.0],
    [-1.0, 1.73, 0.0], [0.0, 0.0, 0.0], [-2.0, 0.0, 0.0],
    [-4.0, 0.0, 0.0], [-2.0, 0.0, 0.0], [-3.0, 1.73, 0.0],
    [-2.0, 3.46, 0.0], [-3.0, 1.73, 0.0], [-1.0, 1.73, 0.0],
    [2.0, 3.46, 0.0], [1.0, 5.2, 0.0], [0.0, 3.46, 0.0],
    [0.0, 3.46, 0.0], [-1.0, 5.2, 0.0], [-2.0, 3.46, 0.0],
    [0.0, 6.93, 0.0], [1.0, 5.2, 0.0], [-1.0, 5.2, 0.0],
];

/// Level-two Sierpinski tetrahedron: four faces of nine triangles each, every
/// triangle its own colour face.
pub fn sierpinski_pyramid() -> FaceMesh {
    let positions: Vec<[f32; 3]> = PYRAMID_THIRDS
        .iter()
        .map(|p| p.map(|v| v / 3.0))
        .collect();
    FaceMesh {
        indices: (0..positions.len() as u32).collect(),
        positions,
        face_sizes: vec![3; 36],
    }
}

/// The classic red/green/blue triangle. Each vertex is its own colour face.
pub fn triangle() -> FaceMesh {
    FaceMesh {
        positions: vec![[0.0, 1.0, 0.0], [-1.0, -1.0, 0.0], [1.0, -1.0, 0.0]],
        indices: vec![0, 1, 2],
        face_sizes: vec![1, 1, 1],
    }
}

pub const TRIANGLE_COLORS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
];

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::geometry::mesh::random_face_colors;

    fn check(shape: FaceMesh, vertices: usize, indices: usize, faces: usize) {
        assert_eq!(shape.positions.len(), vertices);
        assert_eq!(shape.indices.len(), indices);
        assert_eq!(shape.face_count(), faces);
        assert_eq!(shape.face_sizes.iter().sum::<usize>(), vertices);
        let mut rng = StdRng::seed_from_u64(42);
        let colors = random_face_colors(faces, &mut rng);
        let mesh = shape.into_mesh(&colors).expect("valid polyhedron");
        assert_eq!(mesh.colors.len(), vertices);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < vertices));
    }

    #[test]
    fn scutoid_tables_are_consistent() {
        check(scutoid(), 36, 60, 8);
    }

    #[test]
    fn dodecahedron_tables_are_consistent() {
        check(dodecahedron(), 60, 108, 12);
    }

    #[test]
    fn octahedron_tables_are_consistent() {
        check(octahedron(), 24, 24, 8);
    }

    #[test]
    fn pyramid_tables_are_consistent() {
        check(sierpinski_pyramid(), 108, 108, 36);
    }

    #[test]
    fn triangle_keeps_its_vertex_colours() {
        let mesh = triangle().into_mesh(&TRIANGLE_COLORS).unwrap();
        assert_eq!(mesh.colors, TRIANGLE_COLORS.to_vec());
    }

    #[test]
    fn scutoid_indices_stay_within_their_face() {
        let shape = scutoid();
        let mut start = 0u32;
        let mut face_of = Vec::new();
        for (face, &size) in shape.face_sizes.iter().enumerate() {
            face_of.extend(std::iter::repeat_n(face, size));
            start += size as u32;
        }
        assert_eq!(start, 36);
        for tri in shape.indices.chunks(3) {
            let f = face_of[tri[0] as usize];
            assert!(tri.iter().all(|&i| face_of[i as usize] == f));
        }
    }

    #[test]
    fn pyramid_apex_sits_at_a_third_of_the_table() {
        let shape = sierpinski_pyramid();
        let max_y = shape.positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 6.93 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_colour_count_is_an_error() {
        let err = octahedron().into_mesh(&TRIANGLE_COLORS).unwrap_err();
        assert_eq!(err, GeometryError::FaceColorCount { colors: 3, faces: 8 });
    }
}
