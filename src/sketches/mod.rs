//! The sketches. Each one is a [`GraphicsFlow`] wrapped around a plain simulation
//! struct that can be driven (and tested) without a GPU.

use std::{fmt, str::FromStr};

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    data_structures::scene_graph::{ModelNode, Shading},
    error::SketchError,
    flow,
    geometry::MeshData,
    resources::{mesh::model_from_mesh, texture::default_material},
};

pub mod polyhedra;
pub mod pyramid;
pub mod robot_arm;
pub mod shooter;
pub mod sierpinski;
pub mod solar_system;
pub mod triangle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Demo {
    Sierpinski,
    Shooter,
    SolarSystem,
    Polyhedra,
    Pyramid,
    Triangle,
    RobotArm,
}

impl Demo {
    pub const ALL: [Demo; 7] = [
        Demo::Sierpinski,
        Demo::Shooter,
        Demo::SolarSystem,
        Demo::Polyhedra,
        Demo::Pyramid,
        Demo::Triangle,
        Demo::RobotArm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Sierpinski => "sierpinski",
            Demo::Shooter => "shooter",
            Demo::SolarSystem => "solar_system",
            Demo::Polyhedra => "polyhedra",
            Demo::Pyramid => "pyramid",
            Demo::Triangle => "triangle",
            Demo::RobotArm => "robot_arm",
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = SketchError;

    /// Case insensitive, `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Demo::ALL
            .into_iter()
            .find(|demo| demo.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Demo::ALL.iter().map(|demo| demo.name()).collect();
                SketchError::UnknownSketch(s.to_string(), known.join(", "))
            })
    }
}

/// Opens a window and runs `demo` until it is closed.
pub fn run_demo(demo: Demo) -> anyhow::Result<()> {
    log::info!("Starting {demo}");
    match demo {
        Demo::Sierpinski => flow::run(vec![sierpinski::constructor()]),
        Demo::Shooter => flow::run(vec![shooter::constructor()]),
        Demo::SolarSystem => flow::run(vec![solar_system::constructor()]),
        Demo::Polyhedra => flow::run(vec![polyhedra::constructor()]),
        Demo::Pyramid => flow::run(vec![pyramid::constructor()]),
        Demo::Triangle => flow::run(vec![triangle::constructor()]),
        Demo::RobotArm => flow::run(vec![robot_arm::constructor()]),
    }
}

/// Key code of a key press, ignoring releases and repeats of modifiers.
pub(crate) fn pressed_key(event: &WindowEvent) -> Option<KeyCode> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    ..
                },
            ..
        } => Some(*code),
        _ => None,
    }
}

pub(crate) fn digit(code: KeyCode) -> Option<u32> {
    let value = match code {
        KeyCode::Digit0 | KeyCode::Numpad0 => 0,
        KeyCode::Digit1 | KeyCode::Numpad1 => 1,
        KeyCode::Digit2 | KeyCode::Numpad2 => 2,
        KeyCode::Digit3 | KeyCode::Numpad3 => 3,
        KeyCode::Digit4 | KeyCode::Numpad4 => 4,
        KeyCode::Digit5 | KeyCode::Numpad5 => 5,
        KeyCode::Digit6 | KeyCode::Numpad6 => 6,
        KeyCode::Digit7 | KeyCode::Numpad7 => 7,
        KeyCode::Digit8 | KeyCode::Numpad8 => 8,
        KeyCode::Digit9 | KeyCode::Numpad9 => 9,
        _ => return None,
    };
    Some(value)
}

/// One-instance node for a mesh that carries its colours per vertex.
pub(crate) fn vertex_coloured_node(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mesh: &MeshData,
    name: &str,
    shading: Shading,
) -> ModelNode {
    let model = model_from_mesh(device, mesh, name, default_material(device, queue, name));
    ModelNode::from_model(1, 0, device, model).with_shading(shading)
}

/// `#rrggbb` style colour as linear floats with full alpha.
pub(crate) fn rgb(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_names_round_trip() {
        for demo in Demo::ALL {
            assert_eq!(demo.to_string().parse::<Demo>().ok(), Some(demo));
        }
        assert_eq!("Solar-System".parse::<Demo>().ok(), Some(Demo::SolarSystem));
    }

    #[test]
    fn unknown_demo_lists_alternatives() {
        let err = "teapot".parse::<Demo>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("teapot"));
        assert!(msg.contains("robot_arm"));
    }

    #[test]
    fn digits_include_the_numpad() {
        assert_eq!(digit(KeyCode::Digit7), Some(7));
        assert_eq!(digit(KeyCode::Numpad0), Some(0));
        assert_eq!(digit(KeyCode::KeyA), None);
    }

    #[test]
    fn hex_colours_split_into_channels() {
        let [r, g, b, a] = rgb(0xB4A7D6);
        assert!((r - 180.0 / 255.0).abs() < 1e-6);
        assert!((g - 167.0 / 255.0).abs() < 1e-6);
        assert!((b - 214.0 / 255.0).abs() < 1e-6);
        assert_eq!(a, 1.0);
    }
}
