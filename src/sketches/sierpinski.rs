//! Sierpinski triangle drawn flat in an orthographic view.
//!
//! Arrow keys change the subdivision depth, digit keys jump straight to one.

use winit::{event::WindowEvent, keyboard::KeyCode};

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::scene_graph::{ModelNode, SceneNode, Shading},
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::{
        MeshData,
        sierpinski::{FILL, MAX_DEPTH, Triangle2, subdivide, to_mesh},
    },
    render::Render,
    sketches::{digit, pressed_key, vertex_coloured_node},
};

/// Side of the square canvas the triangle is laid out on, in pixels.
pub const CANVAS: f32 = 600.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sierpinski {
    depth: u32,
}

impl Sierpinski {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Clamps to `0..=MAX_DEPTH`. Returns whether the depth changed.
    pub fn set_depth(&mut self, depth: u32) -> bool {
        let depth = depth.min(MAX_DEPTH);
        let changed = depth != self.depth;
        self.depth = depth;
        changed
    }

    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::ArrowUp | KeyCode::ArrowRight => self.set_depth(self.depth + 1),
            KeyCode::ArrowDown | KeyCode::ArrowLeft => self.set_depth(self.depth.saturating_sub(1)),
            code => digit(code).is_some_and(|depth| self.set_depth(depth)),
        }
    }

    /// The triangle anchored at the bottom-left canvas corner spans the full width.
    pub fn triangles(&self) -> Vec<Triangle2> {
        subdivide(0.0, CANVAS, CANVAS, self.depth)
    }

    pub fn mesh(&self) -> MeshData {
        to_mesh(&self.triangles(), CANVAS, CANVAS, FILL)
    }
}

pub struct SierpinskiFlow {
    sketch: Sierpinski,
    node: ModelNode,
}

impl SierpinskiFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let sketch = Sierpinski::default();
        let node = mk_node(&ctx.device, &ctx.queue, &sketch);
        Self { sketch, node }
    }
}

fn mk_node(device: &wgpu::Device, queue: &wgpu::Queue, sketch: &Sierpinski) -> ModelNode {
    vertex_coloured_node(device, queue, &sketch.mesh(), "sierpinski", Shading::Unlit)
}

impl GraphicsFlow<(), ()> for SierpinskiFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
        ctx.clear_colour = wgpu::Color::WHITE;
        ctx.camera.camera = Camera::new((0.0, 0.0, 1.0), (0.0, 0.0, 0.0));
        let (width, height) = ctx.size();
        // the canvas maps onto [-1, 1] vertically
        ctx.projection = Projection::orthographic(width, height, 2.0, 0.1, 10.0);
        ctx.set_title("Sierpinski triangle");
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &Context, _: &mut (), event: &WindowEvent) -> Out<(), ()> {
        if let Some(code) = pressed_key(event)
            && self.sketch.handle_key(code)
        {
            log::info!(
                "Depth {}: {} triangles",
                self.sketch.depth(),
                self.sketch.triangles().len()
            );
            self.node = mk_node(&ctx.device, &ctx.queue, &self.sketch);
            self.node.update_world_transform_all();
        }
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        self.node.get_render()
    }
}

pub fn constructor() -> FlowConsturctor<(), ()> {
    Box::new(|ctx| {
        Box::pin(async move { Box::new(SierpinskiFlow::new(&ctx)) as Box<dyn GraphicsFlow<_, _>> })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_a_single_triangle() {
        let sketch = Sierpinski::default();
        assert_eq!(sketch.depth(), 0);
        assert_eq!(sketch.triangles().len(), 1);
        assert_eq!(sketch.mesh().triangle_count(), 1);
    }

    #[test]
    fn depth_is_clamped() {
        let mut sketch = Sierpinski::default();
        assert!(!sketch.handle_key(KeyCode::ArrowDown));
        assert_eq!(sketch.depth(), 0);
        assert!(sketch.set_depth(42));
        assert_eq!(sketch.depth(), MAX_DEPTH);
        assert!(!sketch.handle_key(KeyCode::ArrowUp));
        assert_eq!(sketch.triangles().len(), 3usize.pow(MAX_DEPTH));
    }

    #[test]
    fn keys_step_and_jump() {
        let mut sketch = Sierpinski::default();
        assert!(sketch.handle_key(KeyCode::ArrowRight));
        assert!(sketch.handle_key(KeyCode::ArrowUp));
        assert_eq!(sketch.depth(), 2);
        assert!(sketch.handle_key(KeyCode::ArrowLeft));
        assert_eq!(sketch.depth(), 1);
        assert!(sketch.handle_key(KeyCode::Digit5));
        assert_eq!(sketch.depth(), 5);
        // same depth again is not a change
        assert!(!sketch.handle_key(KeyCode::Digit5));
        // 9 is past the maximum and clamps
        assert!(sketch.handle_key(KeyCode::Digit9));
        assert_eq!(sketch.depth(), MAX_DEPTH);
        assert!(!sketch.handle_key(KeyCode::Space));
    }

    #[test]
    fn mesh_has_three_vertices_per_triangle() {
        let mut sketch = Sierpinski::default();
        sketch.set_depth(3);
        let mesh = sketch.mesh();
        assert_eq!(mesh.vertex_count(), 27 * 3);
        assert!(mesh.colors.iter().all(|c| *c == FILL));
    }
}
