//! CPU-side procedural geometry.
//!
//! Everything in here is plain data and free of GPU handles so it can be generated,
//! validated and tested without a device. Meshes are uploaded with
//! [`crate::resources::mesh::upload_mesh`].
//!
//! - `mesh` holds [`MeshData`], the common container all generators produce
//! - `sierpinski` implements the recursive triangle subdivision
//! - `polyhedra` contains the hand-authored scutoid, dodecahedron, octahedron, pyramid and triangle tables
//! - `primitives` generates boxes, spheres, planes, rings and circle outlines
//! - `ray` provides picking rays and intersection tests

pub mod mesh;
pub mod polyhedra;
pub mod primitives;
pub mod ray;
pub mod sierpinski;

pub use mesh::{GeometryError, MeshData};
