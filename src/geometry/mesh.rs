use cgmath::{InnerSpace, Vector3};
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    #[error("index {index} at position {position} is out of range for {vertices} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertices: usize,
    },

    #[error("attribute `{name}` has {len} entries but there are {vertices} vertices")]
    AttributeLength {
        name: &'static str,
        len: usize,
        vertices: usize,
    },

    #[error("faces cover {covered} vertices but the mesh has {vertices}")]
    FaceCoverage { covered: usize, vertices: usize },

    #[error("{colors} colours given for {faces} faces")]
    FaceColorCount { colors: usize, faces: usize },
}

/// Indexed triangle mesh with optional per-vertex attributes.
///
/// Attribute vectors are either empty or have exactly one entry per position.
/// Empty attributes are filled with defaults on upload (zero normals, zero UVs, white).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks that every index references an existing vertex and that all
    /// non-empty attributes line up with the positions.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::IncompleteTriangle(self.indices.len()));
        }
        let vertices = self.vertex_count();
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertices)
        {
            return Err(GeometryError::IndexOutOfRange {
                position,
                index,
                vertices,
            });
        }
        let attributes = [
            ("normals", self.normals.len()),
            ("tex_coords", self.tex_coords.len()),
            ("colors", self.colors.len()),
        ];
        for (name, len) in attributes {
            if len != 0 && len != vertices {
                return Err(GeometryError::AttributeLength {
                    name,
                    len,
                    vertices,
                });
            }
        }
        Ok(())
    }

    /// Assigns `colors[i]` to the `face_sizes[i]` consecutive vertices of face `i`.
    pub fn with_face_colors(
        mut self,
        face_sizes: &[usize],
        colors: &[[f32; 4]],
    ) -> Result<Self, GeometryError> {
        if face_sizes.len() != colors.len() {
            return Err(GeometryError::FaceColorCount {
                colors: colors.len(),
                faces: face_sizes.len(),
            });
        }
        let covered: usize = face_sizes.iter().sum();
        if covered != self.vertex_count() {
            return Err(GeometryError::FaceCoverage {
                covered,
                vertices: self.vertex_count(),
            });
        }
        self.colors = face_sizes
            .iter()
            .zip(colors)
            .flat_map(|(&size, &color)| std::iter::repeat_n(color, size))
            .collect();
        Ok(self)
    }

    pub fn with_uniform_color(mut self, color: [f32; 4]) -> Self {
        self.colors = vec![color; self.vertex_count()];
        self
    }

    /// Replaces the normals with area weighted face normals accumulated per vertex.
    pub fn compute_flat_normals(mut self) -> Self {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertex_count()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
            let pa = Vector3::from(self.positions[a]);
            let pb = Vector3::from(self.positions[b]);
            let pc = Vector3::from(self.positions[c]);
            let n = (pb - pa).cross(pc - pa);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        self.normals = normals
            .into_iter()
            .map(|n| {
                if n.magnitude2() > f32::EPSILON {
                    n.normalize().into()
                } else {
                    [0.0, 0.0, 1.0]
                }
            })
            .collect();
        self
    }
}

/// `n` opaque colours with random RGB channels in `[0, 1)`.
pub fn random_face_colors<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<[f32; 4]> {
    (0..n)
        .map(|_| [rng.r#gen(), rng.r#gen(), rng.r#gen(), 1.0])
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn quad() -> MeshData {
        MeshData::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn validates_a_well_formed_mesh() {
        assert_eq!(quad().validate(), Ok(()));
        assert_eq!(quad().triangle_count(), 2);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let mut mesh = quad();
        mesh.indices[4] = 4;
        assert_eq!(
            mesh.validate(),
            Err(GeometryError::IndexOutOfRange {
                position: 4,
                index: 4,
                vertices: 4
            })
        );
    }

    #[test]
    fn rejects_dangling_indices_and_short_attributes() {
        let mut mesh = quad();
        mesh.indices.push(0);
        assert_eq!(mesh.validate(), Err(GeometryError::IncompleteTriangle(7)));

        let mut mesh = quad();
        mesh.colors = vec![[1.0; 4]; 3];
        assert!(matches!(
            mesh.validate(),
            Err(GeometryError::AttributeLength { name: "colors", .. })
        ));
    }

    #[test]
    fn face_colors_are_expanded_per_vertex() {
        let red = [1.0, 0.0, 0.0, 1.0];
        let blue = [0.0, 0.0, 1.0, 1.0];
        let mesh = quad().with_face_colors(&[1, 3], &[red, blue]).unwrap();
        assert_eq!(mesh.colors, vec![red, blue, blue, blue]);

        assert!(quad().with_face_colors(&[2, 3], &[red, blue]).is_err());
        assert!(quad().with_face_colors(&[4], &[red, blue]).is_err());
    }

    #[test]
    fn flat_normals_of_a_ccw_quad_face_towards_the_viewer() {
        let mesh = quad().compute_flat_normals();
        for n in mesh.normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn random_colors_are_opaque_and_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let colors = random_face_colors(32, &mut rng);
        assert_eq!(colors.len(), 32);
        for c in colors {
            assert_eq!(c[3], 1.0);
            assert!(c[..3].iter().all(|v| (0.0..1.0).contains(v)));
        }
    }
}
