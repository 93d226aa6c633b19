//! The red, green and blue triangle. Static.

use std::f32::consts::FRAC_PI_4;

use cgmath::{Rad, Vector3};

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        scene_graph::{ModelNode, SceneNode, Shading},
    },
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::polyhedra::{TRIANGLE_COLORS, triangle},
    render::Render,
    sketches::{polyhedra::SHADE, vertex_coloured_node},
};

pub const POSITION: Vector3<f32> = Vector3::new(0.0, 0.0, -4.0);

pub struct TriangleFlow {
    node: Option<ModelNode>,
}

impl TriangleFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let node = match triangle().into_mesh(&TRIANGLE_COLORS) {
            Ok(mesh) => {
                let mut node =
                    vertex_coloured_node(&ctx.device, &ctx.queue, &mesh, "triangle", Shading::Unlit);
                node.set_local_transform(0, Instance::from(POSITION).with_tint(SHADE));
                node.update_world_transform_all();
                node.write_to_buffers(&ctx.queue, &ctx.device);
                Some(node)
            }
            Err(e) => {
                log::error!("The triangle could not be built: {e}");
                None
            }
        };
        Self { node }
    }
}

impl GraphicsFlow<(), ()> for TriangleFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
        ctx.clear_colour = wgpu::Color::BLACK;
        ctx.camera.camera = Camera::looking_to((0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let (width, height) = ctx.size();
        ctx.projection = Projection::perspective(width, height, Rad(FRAC_PI_4), 1.0, 5.0);
        ctx.set_title("Triangle");
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        self.node.as_ref().map_or(Render::None, |node| node.get_render())
    }
}

pub fn constructor() -> FlowConsturctor<(), ()> {
    Box::new(|ctx| {
        Box::pin(async move { Box::new(TriangleFlow::new(&ctx)) as Box<dyn GraphicsFlow<_, _>> })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_keep_their_own_colour() {
        let mesh = triangle().into_mesh(&TRIANGLE_COLORS).unwrap();
        assert_eq!(mesh.colors, TRIANGLE_COLORS.to_vec());
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn sits_inside_the_view_volume() {
        // near 1 and far 5 with the camera at the origin
        assert!(-POSITION.z > 1.0 && -POSITION.z < 5.0);
    }
}
