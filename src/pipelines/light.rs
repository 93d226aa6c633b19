//! Light uniform bound at group 2 of the model pipelines.
//!
//! A point light shines from `position`. A directional light stores the direction
//! towards the light in `position` instead and sets `directional`. The ambient term
//! has its own colour, and an optional spot light can be added on top.

use cgmath::{InnerSpace, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // fills the vec3 padding
    pub ambient: f32,
    pub color: [f32; 3],
    pub directional: u32,
    pub ambient_color: [f32; 3],
    /// Cosine of the cone half angle.
    pub spot_cos_outer: f32,
    pub spot_position: [f32; 3],
    /// Cosine where the penumbra ends and the cone is fully lit.
    pub spot_cos_inner: f32,
    pub spot_direction: [f32; 3],
    pub spot_enabled: u32,
    pub spot_color: [f32; 3],
    /// Distance at which the spot fades out, 0 for no limit.
    pub spot_range: f32,
}

impl LightUniform {
    pub fn point<P: Into<Point3<f32>>>(position: P, color: [f32; 3], ambient: f32) -> Self {
        Self {
            position: position.into().into(),
            ambient,
            color,
            ..Self::dark()
        }
    }

    /// Light placed at `from` shining towards `to`, infinitely far away.
    pub fn directional<P: Into<Point3<f32>>>(from: P, to: P, color: [f32; 3], ambient: f32) -> Self {
        let towards_light: Vector3<f32> = from.into() - to.into();
        Self {
            position: towards_light.normalize().into(),
            ambient,
            color,
            directional: 1,
            ..Self::dark()
        }
    }

    fn dark() -> Self {
        Self {
            position: [0.0; 3],
            ambient: 0.0,
            color: [0.0; 3],
            directional: 0,
            ambient_color: [1.0; 3],
            spot_cos_outer: 1.0,
            spot_position: [0.0; 3],
            spot_cos_inner: 1.0,
            spot_direction: [0.0, -1.0, 0.0],
            spot_enabled: 0,
            spot_color: [0.0; 3],
            spot_range: 0.0,
        }
    }

    pub fn with_ambient_color(mut self, color: [f32; 3]) -> Self {
        self.ambient_color = color;
        self
    }

    pub fn with_spot(mut self, spot: SpotLight) -> Self {
        let direction = spot.target - spot.position;
        self.spot_position = spot.position.into();
        self.spot_direction = direction.normalize().into();
        self.spot_cos_outer = spot.angle.0.cos();
        self.spot_cos_inner = (spot.angle.0 * (1.0 - spot.penumbra)).cos();
        self.spot_color = spot.color;
        self.spot_range = spot.range;
        self.spot_enabled = 1;
        self
    }

    pub fn is_directional(&self) -> bool {
        self.directional != 0
    }

    pub fn has_spot(&self) -> bool {
        self.spot_enabled != 0
    }
}

/// Cone of light from `position` towards `target`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub color: [f32; 3],
    /// Half angle of the cone.
    pub angle: Rad<f32>,
    /// Fraction of the cone that fades towards its edge, between 0 and 1.
    pub penumbra: f32,
    pub range: f32,
}

impl SpotLight {
    /// Aimed at the origin with a cone of π/3, a hard edge and no range limit.
    pub fn new<P: Into<Point3<f32>>>(position: P, color: [f32; 3]) -> Self {
        Self {
            position: position.into(),
            target: Point3::new(0.0, 0.0, 0.0),
            color,
            angle: Rad(std::f32::consts::FRAC_PI_3),
            penumbra: 0.0,
            range: 0.0,
        }
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::point([8.0, 80.0, 50.0], [1.0, 1.0, 1.0], 0.1)
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_the_wgsl_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 96);
        assert_eq!(std::mem::offset_of!(LightUniform, ambient_color), 32);
        assert_eq!(std::mem::offset_of!(LightUniform, spot_position), 48);
        assert_eq!(std::mem::offset_of!(LightUniform, spot_direction), 64);
        assert_eq!(std::mem::offset_of!(LightUniform, spot_color), 80);
    }

    #[test]
    fn plain_lights_have_white_ambient_and_no_spot() {
        let light = LightUniform::point([1.0, 2.0, 3.0], [0.5; 3], 0.1);
        assert_eq!(light.ambient_color, [1.0; 3]);
        assert!(!light.has_spot());
        assert!(!light.is_directional());
    }

    #[test]
    fn ambient_colour_is_kept_apart_from_the_main_light() {
        let light = LightUniform::directional([0.0, 5.0, 100.0], [0.0, 0.0, 0.0], [0.67; 3], 0.3)
            .with_ambient_color([1.0, 0.8, 0.667]);
        assert_eq!(light.ambient_color, [1.0, 0.8, 0.667]);
        assert_eq!(light.color, [0.67; 3]);
        assert_eq!(light.ambient, 0.3);
    }

    #[test]
    fn spot_light_points_at_its_target() {
        let light = LightUniform::default().with_spot(SpotLight::new([0.0, 8.0, 100.0], [1.0; 3]));
        assert!(light.has_spot());
        assert_eq!(light.spot_position, [0.0, 8.0, 100.0]);
        let dir = Vector3::from(light.spot_direction);
        let expected = Vector3::new(0.0, -8.0, -100.0).normalize();
        assert!((dir - expected).magnitude() < 1e-5);
        assert!((light.spot_cos_outer - 0.5).abs() < 1e-5);
        // no penumbra: hard edge
        assert!((light.spot_cos_inner - light.spot_cos_outer).abs() < 1e-6);
        assert_eq!(light.spot_color, [1.0; 3]);
    }

    #[test]
    fn penumbra_widens_the_lit_core() {
        let spot = SpotLight {
            penumbra: 0.5,
            ..SpotLight::new([0.0, 8.0, 0.0], [1.0; 3])
        };
        let light = LightUniform::default().with_spot(spot);
        assert!(light.spot_cos_inner > light.spot_cos_outer);
        assert!((light.spot_cos_inner - (std::f32::consts::FRAC_PI_6).cos()).abs() < 1e-5);
    }

    #[test]
    fn directional_light_points_back_at_the_source() {
        let light = LightUniform::directional([-0.5, 0.2, 1.0], [0.0, -2.0, 0.0], [1.0; 3], 0.2);
        assert!(light.is_directional());
        let dir = Vector3::from(light.position);
        assert!((dir.magnitude() - 1.0).abs() < 1e-5);
        let expected = Vector3::new(-0.5, 2.2, 1.0).normalize();
        assert!((dir - expected).magnitude() < 1e-5);
        assert_eq!(light.ambient, 0.2);
    }
}
