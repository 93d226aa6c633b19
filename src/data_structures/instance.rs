//! Instance transformation data for GPU rendering.
//!
//! Per-instance data like position, rotation, scale and colour modulation is stored
//! in GPU buffers and passed to shaders for instanced draws.

use std::ops::Mul;

use cgmath::{Matrix4, One, Quaternion, Vector3};

use crate::data_structures::model;

/// Per-instance transformation: position, rotation (as quaternion) and scale,
/// plus a colour `tint` multiplied onto the surface and an additive `emissive` colour.
///
/// Multiple copies of the same model can be rendered with different transforms in a
/// single draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub tint: [f32; 4],
    pub emissive: [f32; 3],
}

impl Instance {
    /// Identity transformation, white tint, no emission.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            tint: [1.0; 4],
            emissive: [0.0; 3],
        }
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    pub fn with_tint(mut self, tint: [f32; 4]) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_emissive(mut self, emissive: [f32; 3]) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
            tint: self.tint,
            emissive: self.emissive,
        }
    }
}

/// `parent * child` places `child` (given in the parent's space) into the parent's
/// space. Colours are taken from the child.
impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Instance {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
            tint: rhs.tint,
            emissive: rhs.emissive,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl From<Quaternion<f32>> for Instance {
    fn from(rotation: Quaternion<f32>) -> Self {
        Instance {
            rotation,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    tint: [f32; 4],
    emissive: [f32; 3],
}

/**
 * Model matrix as four vec4 slots (locations 6-9), the normal matrix as three vec3
 * slots (10-12), then tint (13) and emissive (14). Locations 0-5 belong to the vertex.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance once per instance instead of once per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 13,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 29]>() as wgpu::BufferAddress,
                    shader_location: 14,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Rad, Rotation3, SquareMatrix, Transform};

    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn composition_matches_matrix_product() {
        let parent = Instance::from(Vector3::new(1.0, 2.0, 3.0))
            .with_rotation(Quaternion::from_angle_z(Rad(0.7)))
            .with_scale(2.0);
        let child = Instance::from(Vector3::new(0.0, -1.2, 0.0))
            .with_rotation(Quaternion::from_angle_x(Rad(-0.4)));
        let composed = (&parent * &child).to_matrix();
        let expected = parent.to_matrix() * child.to_matrix();
        let p = cgmath::Point3::new(0.3, 0.5, -0.2);
        let a = composed.transform_point(p);
        let b = expected.transform_point(p);
        assert!((a - b).magnitude() < 1e-4);
    }

    #[test]
    fn rotation_turns_child_offsets() {
        let parent = Instance::from(Quaternion::from_angle_z(Rad(std::f32::consts::FRAC_PI_2)));
        let child = Instance::from(Vector3::new(0.0, -1.0, 0.0));
        let world = &parent * &child;
        assert!(close(world.position, Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn colours_come_from_the_child() {
        let parent = Instance::new().with_tint([0.1, 0.2, 0.3, 1.0]);
        let child = Instance::new().with_emissive([1.0, 0.0, 0.0]);
        let world = parent * child;
        assert_eq!(world.tint, [1.0; 4]);
        assert_eq!(world.emissive, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn raw_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 32 * 4);
        let raw = Instance::new().to_raw();
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        assert_eq!(raw.model, identity);
    }
}
