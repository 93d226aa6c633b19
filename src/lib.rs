//! flow-sketches
//!
//! Small interactive 3D sketches (a Sierpinski triangle, a cube shooter, a solar
//! system, spinning polyhedra, a Sierpinski pyramid, a triangle and a robot arm) on a
//! cross-platform instancing runtime that runs natively and in the browser.
//!
//! High-level modules
//! - `geometry`: procedural meshes, polyhedron tables, Sierpinski subdivision and rays
//! - `kinematics`: the robot arm's joint chain and forward kinematics
//! - `camera`: camera types, orbit controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, instances, textures and the scene graph
//! - `flow`: the `GraphicsFlow` trait and the application loop
//! - `pick`: GPU object picking
//! - `pipelines`: lit, unlit, line and pick pipelines with their shaders
//! - `resources`: asset loading and mesh upload
//! - `render`: render composition for pipeline batching
//! - `sketches`: the demos themselves
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod kinematics;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod sketches;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use sketches::{Demo, run_demo};
pub use wgpu;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

/// Browser entry point: `start("solar_system")` runs that sketch in the `canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn start(name: &str) -> Result<(), wasm_bindgen::JsValue> {
    let demo: Demo = name
        .parse()
        .map_err(|e: error::SketchError| wasm_bindgen::JsValue::from_str(&e.to_string()))?;
    run_demo(demo).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
