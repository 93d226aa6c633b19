//! Render pipelines. All model pipelines share the vertex and instance layouts and
//! the material / camera / light bind groups; only the shader, topology and culling
//! differ.

pub mod basic;
pub mod light;
pub mod lines;
pub mod pick;
pub mod unlit;
