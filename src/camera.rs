//! Camera, projection and the orbit controller.
//!
//! The camera is a look-at camera. [`Projection`] is either perspective or orthographic
//! and always produces matrices for wgpu's `[0, 1]` depth range.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, ortho, perspective};
use instant::Duration;
use winit::{
    dpi::PhysicalPosition,
    event::{MouseScrollDelta, WindowEvent},
};

use crate::geometry::ray::Ray;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// keeps the orbit off the poles where `up` and the view direction line up
const POLAR_MARGIN: f32 = 0.0001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    /// Camera at `position` looking along `direction`.
    pub fn looking_to<P: Into<Point3<f32>>>(position: P, direction: Vector3<f32>) -> Self {
        let position = position.into();
        Self::new(position, position + direction.normalize())
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_proj(&self, projection: &Projection) -> Matrix4<f32> {
        projection.matrix() * self.view_matrix()
    }

    /// Ray from the eye through the pixel at `coords` (window pixels, y down).
    pub fn cast_ray_from_mouse(
        &self,
        coords: PhysicalPosition<f64>,
        width: u32,
        height: u32,
        projection: &Projection,
    ) -> Option<Ray> {
        if width == 0 || height == 0 {
            return None;
        }
        let ndc_x = (coords.x / width as f64 * 2.0 - 1.0) as f32;
        let ndc_y = (1.0 - coords.y / height as f64 * 2.0) as f32;
        Ray::from_ndc(ndc_x, ndc_y, self.view_proj(projection))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectionKind {
    Perspective { fovy: Rad<f32> },
    /// Visible world height; the width follows the aspect ratio.
    Orthographic { height: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub kind: ProjectionKind,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn perspective<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect(width, height),
            kind: ProjectionKind::Perspective { fovy: fovy.into() },
            znear,
            zfar,
        }
    }

    pub fn orthographic(width: u32, height: u32, view_height: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect(width, height),
            kind: ProjectionKind::Orthographic { height: view_height },
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect(width, height);
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        let projection = match self.kind {
            ProjectionKind::Perspective { fovy } => perspective(fovy, self.aspect, self.znear, self.zfar),
            ProjectionKind::Orthographic { height } => {
                let half_h = height / 2.0;
                let half_w = half_h * self.aspect;
                ortho(-half_w, half_w, -half_h, half_h, self.znear, self.zfar)
            }
        };
        OPENGL_TO_WGPU_MATRIX * projection
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.view_proj(projection).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbits the camera around its target. Right-drag turns, the wheel zooms.
/// Disabled by default; sketches that want it switch it on in `on_init`.
#[derive(Clone, Debug)]
pub struct CameraController {
    pub enabled: bool,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    pub sensitivity: f32,
    pub zoom_factor: f32,
    pub min_distance: f32,
}

impl CameraController {
    pub fn new(sensitivity: f32, zoom_factor: f32) -> Self {
        Self {
            enabled: false,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            sensitivity,
            zoom_factor,
            min_distance: 1.0,
        }
    }

    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        if !self.enabled {
            return;
        }
        self.rotate_horizontal += mouse_dx as f32;
        self.rotate_vertical += mouse_dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if !self.enabled {
            return;
        }
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll += match delta {
                MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 50.0,
            };
        }
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        if !self.enabled {
            return;
        }
        let dt = dt.as_secs_f32();
        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude();
        if radius <= f32::EPSILON {
            return;
        }
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth -= self.rotate_horizontal * self.sensitivity * dt;
        polar -= self.rotate_vertical * self.sensitivity * dt;
        polar = polar.clamp(POLAR_MARGIN, std::f32::consts::PI - POLAR_MARGIN);
        radius = (radius * self.zoom_factor.powf(self.scroll)).max(self.min_distance);

        camera.position = camera.target
            + Vector3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(0.4, 0.9)
    }
}

/// Everything the engine keeps for the camera: the CPU side and its uniform buffer.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn write(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}
