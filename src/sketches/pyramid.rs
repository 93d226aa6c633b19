//! Sierpinski pyramid, tilted towards the viewer and turning about its own Y axis.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_8};

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::scene_graph::{ModelNode, SceneNode, Shading},
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::{mesh::random_face_colors, polyhedra::sierpinski_pyramid},
    render::Render,
    sketches::{polyhedra::Spinner, vertex_coloured_node},
};

pub const POSITION: Vector3<f32> = Vector3::new(0.0, -0.5, -6.0);
pub const TILT: f32 = FRAC_PI_8;
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

pub fn spinner() -> Spinner {
    Spinner::new(POSITION, Vector3::unit_y()).with_rotation(Quaternion::from_angle_x(Rad(TILT)))
}

pub struct PyramidFlow {
    spinner: Spinner,
    node: Option<ModelNode>,
}

impl PyramidFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let shape = sierpinski_pyramid();
        let colors = random_face_colors(shape.face_count(), &mut rand::thread_rng());
        let node = match shape.into_mesh(&colors) {
            Ok(mesh) => Some(vertex_coloured_node(&ctx.device, &ctx.queue, &mesh, "pyramid", Shading::Unlit)),
            Err(e) => {
                log::error!("The pyramid could not be built: {e}");
                None
            }
        };
        Self {
            spinner: spinner(),
            node,
        }
    }
}

impl GraphicsFlow<(), ()> for PyramidFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
        ctx.clear_colour = BACKGROUND;
        ctx.camera.camera = Camera::looking_to((0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let (width, height) = ctx.size();
        ctx.projection = Projection::perspective(width, height, Rad(FRAC_PI_4), 1.0, 100.0);
        ctx.set_title("Sierpinski pyramid");
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), ()> {
        self.spinner.update(dt);
        if let Some(node) = &mut self.node {
            node.set_local_transform(0, self.spinner.instance.clone());
            node.update_world_transform_all();
            node.write_to_buffers(&ctx.queue, &ctx.device);
        }
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        self.node.as_ref().map_or(Render::None, |node| node.get_render())
    }
}

pub fn constructor() -> FlowConsturctor<(), ()> {
    Box::new(|ctx| {
        Box::pin(async move { Box::new(PyramidFlow::new(&ctx)) as Box<dyn GraphicsFlow<_, _>> })
    })
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Rotation};

    use super::*;

    #[test]
    fn background_is_dark_grey() {
        assert_eq!(BACKGROUND, wgpu::Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 });
        assert_ne!(BACKGROUND, wgpu::Color::BLACK);
    }

    #[test]
    fn spins_about_the_tilted_axis() {
        let mut pyramid = spinner();
        let up = pyramid.instance.rotation.rotate_vector(Vector3::unit_y());
        pyramid.update(Duration::from_millis(3000));
        // the object's own Y axis does not move while it spins about it
        let after = pyramid.instance.rotation.rotate_vector(Vector3::unit_y());
        assert!((up - after).magnitude() < 1e-4);
        assert!((up - Vector3::unit_y()).magnitude() > 0.1);
        assert_eq!(pyramid.instance.position, POSITION);
    }
}
