//! Scutoid, dodecahedron and octahedron spinning side by side, each face a random
//! colour. The octahedron also bobs up and down along its own Y axis.

use std::f32::consts::{FRAC_PI_4, TAU};

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        scene_graph::{ModelNode, SceneNode, Shading},
    },
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::{
        mesh::random_face_colors,
        polyhedra::{FaceMesh, dodecahedron, octahedron, scutoid},
    },
    render::Render,
    sketches::vertex_coloured_node,
};

/// Time for one full turn.
pub const SPIN_PERIOD_MILLIS: f32 = 10_000.0;
/// Colours are darkened the same way the fragment shader of the raw sketches did.
pub const SHADE: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
pub const BOB_STEP: f32 = 0.005;
pub const BOB_UPDATES: i32 = 400;

/// An object turning about a fixed axis in its own space.
#[derive(Clone, Debug, PartialEq)]
pub struct Spinner {
    pub axis: Vector3<f32>,
    pub instance: Instance,
}

impl Spinner {
    pub fn new(position: Vector3<f32>, axis: Vector3<f32>) -> Self {
        Self {
            axis: axis.normalize(),
            instance: Instance::from(position),
        }
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.instance.rotation = rotation;
        self
    }

    pub fn angle(dt: Duration) -> Rad<f32> {
        Rad(TAU * dt.as_secs_f32() * 1000.0 / SPIN_PERIOD_MILLIS)
    }

    pub fn update(&mut self, dt: Duration) {
        let turn = Quaternion::from_axis_angle(self.axis, Self::angle(dt));
        self.instance.rotation = (self.instance.rotation * turn).normalize();
    }

    /// Moves along the object's own Y axis.
    pub fn translate_y(&mut self, distance: f32) {
        self.instance.position += self.instance.rotation * Vector3::new(0.0, distance, 0.0);
    }
}

/// Up and down motion: `BOB_UPDATES` steps up from the start, then back and forth
/// between the two turning points. The update that turns around repeats the previous
/// step once, at the top as well as at the bottom.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bob {
    falling: bool,
    count: i32,
    step: f32,
}

impl Bob {
    /// The distance to move this update.
    pub fn advance(&mut self) -> f32 {
        if self.falling {
            if self.count > -BOB_UPDATES {
                self.step = -BOB_STEP;
                self.count -= 1;
            } else {
                self.falling = false;
            }
        } else if self.count < BOB_UPDATES {
            self.step = BOB_STEP;
            self.count += 1;
        } else {
            self.falling = true;
        }
        self.step
    }
}

struct Shape {
    spinner: Spinner,
    node: ModelNode,
    bob: Option<Bob>,
}

pub struct PolyhedraFlow {
    shapes: Vec<Shape>,
}

fn mk_node(device: &wgpu::Device, queue: &wgpu::Queue, name: &str, shape: FaceMesh) -> Option<ModelNode> {
    let colors = random_face_colors(shape.face_count(), &mut rand::thread_rng());
    match shape.into_mesh(&colors) {
        Ok(mesh) => Some(vertex_coloured_node(device, queue, &mesh, name, Shading::Unlit)),
        Err(e) => {
            log::error!("{name} is skipped: {e}");
            None
        }
    }
}

impl PolyhedraFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let (device, queue) = (&ctx.device, &ctx.queue);
        let layout = [
            ("scutoid", scutoid(), Vector3::new(-3.2, 0.0, -2.0), Vector3::new(1.0, 1.0, 0.2), false),
            ("dodecahedron", dodecahedron(), Vector3::new(1.0, 0.0, -2.0), Vector3::new(-0.4, 1.0, 0.1), false),
            ("octahedron", octahedron(), Vector3::new(4.3, 0.0, -2.0), Vector3::new(0.0, 1.0, 0.0), true),
        ];
        let shapes = layout
            .into_iter()
            .filter_map(|(name, shape, position, axis, bobs)| {
                mk_node(device, queue, name, shape).map(|node| Shape {
                    spinner: Spinner::new(position, axis),
                    node,
                    bob: bobs.then(Bob::default),
                })
            })
            .collect();
        Self { shapes }
    }
}

impl GraphicsFlow<(), ()> for PolyhedraFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
        ctx.clear_colour = wgpu::Color {
            r: 0.1,
            g: 0.1,
            b: 0.1,
            a: 1.0,
        };
        ctx.camera.camera = Camera::looking_to((0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let (width, height) = ctx.size();
        ctx.projection = Projection::perspective(width, height, Rad(FRAC_PI_4), 1.0, 100.0);
        ctx.set_title("Polyhedra");
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), ()> {
        for shape in &mut self.shapes {
            shape.spinner.update(dt);
            if let Some(bob) = &mut shape.bob {
                shape.spinner.translate_y(bob.advance());
            }
            shape
                .node
                .set_local_transform(0, shape.spinner.instance.clone().with_tint(SHADE));
            shape.node.update_world_transform_all();
            shape.node.write_to_buffers(&ctx.queue, &ctx.device);
        }
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Composed(self.shapes.iter().map(|shape| shape.node.get_render()).collect())
    }
}

pub fn constructor() -> FlowConsturctor<(), ()> {
    Box::new(|ctx| {
        Box::pin(async move { Box::new(PolyhedraFlow::new(&ctx)) as Box<dyn GraphicsFlow<_, _>> })
    })
}
