//! Robot arm built from nested joint groups. The keyboard stands in for a slider
//! panel: Tab / Shift+Tab or 1-7 select a joint angle, Up / Down change it.

use cgmath::Deg;
use winit::{event::WindowEvent, keyboard::KeyCode};

use crate::{
    camera::{Camera, Projection},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode, Shading},
    },
    flow::{FlowConsturctor, GraphicsFlow, Out},
    geometry::primitives::cuboid,
    kinematics::{CONTROLS, Control, Joint, RobotArm, SEGMENTS},
    pipelines::light::LightUniform,
    render::Render,
    sketches::{digit, pressed_key, rgb, vertex_coloured_node},
};

pub const ARM_COLOUR: u32 = 0xB4A7D6;
/// Radians per key press.
pub const STEP: f32 = 0.05;
pub const AMBIENT_COLOUR: u32 = 0xFFCCAA;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlChange {
    Selected(&'static Control),
    Adjusted(&'static Control, f32),
}

#[derive(Clone, Debug, Default)]
pub struct ArmControls {
    arm: RobotArm,
    selected: usize,
}

impl ArmControls {
    pub fn arm(&self) -> &RobotArm {
        &self.arm
    }

    pub fn selected(&self) -> &'static Control {
        &CONTROLS[self.selected]
    }

    pub fn select(&mut self, index: usize) -> Option<&'static Control> {
        (index < CONTROLS.len()).then(|| {
            self.selected = index;
            self.selected()
        })
    }

    pub fn select_next(&mut self) -> &'static Control {
        self.selected = (self.selected + 1) % CONTROLS.len();
        self.selected()
    }

    pub fn select_previous(&mut self) -> &'static Control {
        self.selected = (self.selected + CONTROLS.len() - 1) % CONTROLS.len();
        self.selected()
    }

    /// Moves the selected angle by `steps` key presses. Returns the clamped value.
    pub fn adjust(&mut self, steps: f32) -> f32 {
        let control = self.selected();
        self.arm.nudge(control, steps * STEP)
    }

    pub fn handle_key(&mut self, code: KeyCode, shift: bool) -> Option<ControlChange> {
        match code {
            KeyCode::Tab if shift => Some(ControlChange::Selected(self.select_previous())),
            KeyCode::Tab => Some(ControlChange::Selected(self.select_next())),
            KeyCode::ArrowUp => Some(ControlChange::Adjusted(self.selected(), self.adjust(1.0))),
            KeyCode::ArrowDown => Some(ControlChange::Adjusted(self.selected(), self.adjust(-1.0))),
            code => digit(code)
                .and_then(|d| d.checked_sub(1))
                .and_then(|index| self.select(index as usize))
                .map(ControlChange::Selected),
        }
    }
}

/// Nests one group per joint, shoulder outermost. `decorate` fills each group before
/// the next joint is appended as its last child.
fn joint_chain(
    locals: [Instance; 5],
    mut decorate: impl FnMut(Joint, &mut ContainerNode),
) -> ContainerNode {
    let mut chain: Option<ContainerNode> = None;
    for (joint, local) in Joint::ALL.into_iter().zip(locals).rev() {
        let mut group = ContainerNode::with_local(local);
        decorate(joint, &mut group);
        if let Some(below) = chain.take() {
            group.add_child(Box::new(below));
        }
        chain = Some(group);
    }
    chain.unwrap_or_else(|| ContainerNode::new(1))
}

/// Writes the joint transforms down the chain built by [`joint_chain`].
fn apply_pose(node: &mut dyn SceneNode, locals: &[Instance]) {
    let Some((local, rest)) = locals.split_first() else {
        return;
    };
    node.set_local_transform(0, local.clone());
    if !rest.is_empty()
        && let Some(next) = node.get_children_mut().last_mut()
    {
        apply_pose(next.as_mut(), rest);
    }
}

pub struct RobotArmFlow {
    controls: ArmControls,
    shoulder: ContainerNode,
    shift: bool,
}

impl RobotArmFlow {
    pub fn new(ctx: &InitContext) -> Self {
        let controls = ArmControls::default();
        let (device, queue) = (&ctx.device, &ctx.queue);
        let mut shoulder = joint_chain(controls.arm().local_transforms(), |joint, group| {
            for segment in SEGMENTS.iter().filter(|segment| segment.joint == joint) {
                let mesh = cuboid(segment.size.x, segment.size.y, segment.size.z)
                    .with_uniform_color(rgb(ARM_COLOUR));
                let name = format!("{joint:?} segment");
                let mut node = vertex_coloured_node(device, queue, &mesh, &name, Shading::Lit);
                node.set_local_transform(0, Instance::from(segment.offset));
                group.add_child(Box::new(node));
            }
        });
        shoulder.update_world_transform_all();
        shoulder.write_to_buffers(queue, device);
        Self {
            controls,
            shoulder,
            shift: false,
        }
    }

    fn pose(&mut self, ctx: &Context) {
        apply_pose(&mut self.shoulder, &self.controls.arm().local_transforms());
        self.shoulder.update_world_transform_all();
        self.shoulder.write_to_buffers(&ctx.queue, &ctx.device);
    }
}

impl GraphicsFlow<(), ()> for RobotArmFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), ()> {
        ctx.clear_colour = wgpu::Color {
            r: 0.2,
            g: 0.2,
            b: 0.2,
            a: 1.0,
        };
        ctx.camera.camera = Camera::new((0.0, 0.0, 13.0), (0.0, 0.0, 0.0));
        let (width, height) = ctx.size();
        ctx.projection = Projection::perspective(width, height, Deg(45.0), 1.0, 4000.0);
        ctx.light.uniform = light();
        ctx.set_title("Robot arm");
        log::info!("Selected {}", self.controls.selected().name);
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &Context, _: &mut (), event: &WindowEvent) -> Out<(), ()> {
        if let WindowEvent::ModifiersChanged(modifiers) = event {
            self.shift = modifiers.state().shift_key();
        }
        let Some(code) = pressed_key(event) else {
            return Out::Empty;
        };
        match self.controls.handle_key(code, self.shift) {
            Some(ControlChange::Selected(control)) => {
                log::info!("Selected {} ({:.2})", control.name, self.controls.arm().get(control));
            }
            Some(ControlChange::Adjusted(control, value)) => {
                log::info!("{} = {value:.2}", control.name);
                self.pose(ctx);
            }
            None => {}
        }
        Out::Empty
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        self.shoulder.get_render()
    }
}

pub fn constructor() -> FlowConsturctor<(), ()> {
    Box::new(|ctx| {
        Box::pin(async move { Box::new(RobotArmFlow::new(&ctx)) as Box<dyn GraphicsFlow<_, _>> })
    })
}

/// White key light from the upper left over a warm ambient.
pub fn light() -> LightUniform {
    let [r, g, b, _] = rgb(AMBIENT_COLOUR);
    LightUniform::directional((-0.5, 0.2, 1.0), (0.0, -2.0, 0.0), [1.0; 3], 0.2)
        .with_ambient_color([r, g, b])
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn ambient_light_is_warm() {
        let light = light();
        assert_eq!(light.ambient_color, [1.0, 0.8, 170.0 / 255.0]);
        assert_eq!(light.color, [1.0; 3]);
        assert_eq!(light.ambient, 0.2);
        assert!(light.is_directional());
    }

    fn hand_of(chain: &ContainerNode) -> Vector3<f32> {
        let mut node: &dyn SceneNode = chain;
        while let Some(next) = node.get_children().last() {
            node = next.as_ref();
        }
        node.get_world_transforms()[0].position
    }

    #[test]
    fn tab_cycles_through_all_controls() {
        let mut controls = ArmControls::default();
        assert_eq!(controls.selected().name, "shoulder x");
        for _ in 0..CONTROLS.len() {
            controls.handle_key(KeyCode::Tab, false);
        }
        assert_eq!(controls.selected().name, "shoulder x");
        let back = controls.handle_key(KeyCode::Tab, true);
        assert_eq!(back, Some(ControlChange::Selected(&CONTROLS[6])));
    }

    #[test]
    fn digits_select_by_position() {
        let mut controls = ArmControls::default();
        assert_eq!(
            controls.handle_key(KeyCode::Digit3, false),
            Some(ControlChange::Selected(&CONTROLS[2]))
        );
        assert_eq!(controls.handle_key(KeyCode::Digit0, false), None);
        assert_eq!(controls.handle_key(KeyCode::Digit8, false), None);
        assert_eq!(controls.selected().name, "elbow x");
    }

    #[test]
    fn arrows_adjust_within_limits() {
        let mut controls = ArmControls::default();
        controls.select(2);
        // the elbow only bends one way
        assert_eq!(
            controls.handle_key(KeyCode::ArrowUp, false),
            Some(ControlChange::Adjusted(&CONTROLS[2], 0.0))
        );
        for _ in 0..30 {
            controls.handle_key(KeyCode::ArrowDown, false);
        }
        assert_eq!(controls.arm().get(&CONTROLS[2]), -1.0);
    }

    #[test]
    fn scene_graph_agrees_with_forward_kinematics() {
        let mut controls = ArmControls::default();
        let mut chain = joint_chain(controls.arm().local_transforms(), |_, _| {});
        chain.update_world_transform_all();
        assert!((hand_of(&chain) - controls.arm().hand_position()).magnitude() < 1e-4);

        controls.select(1);
        controls.adjust(10.0);
        controls.select(2);
        controls.adjust(-8.0);
        controls.select(5);
        controls.adjust(3.0);
        apply_pose(&mut chain, &controls.arm().local_transforms());
        chain.update_world_transform_all();
        assert!((hand_of(&chain) - controls.arm().hand_position()).magnitude() < 1e-4);
    }
}
