//! Error types for the sketch runtime.
//!
//! Most fallible functions return `anyhow::Result`. The variants below name the
//! failures callers may want to match on: a missing canvas on the web, a missing
//! adapter, an asset that could not be found or a sketch name that does not exist.
//! Invalid meshes are reported as [`crate::geometry::GeometryError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SketchError {
    /// The HTML canvas the sketch draws into is not part of the page.
    #[error("Failed to load the canvas element `{0}`.")]
    MissingCanvas(String),

    /// No GPU adapter supports the surface (on the web this means WebGL2 is unavailable).
    #[error("Your browser does not support WebGL, or it is not enabled by default: {0}")]
    AdapterUnavailable(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Unknown sketch `{0}`. Expected one of: {1}")]
    UnknownSketch(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_missing_piece() {
        assert_eq!(
            SketchError::MissingCanvas("flow-canvas".into()).to_string(),
            "Failed to load the canvas element `flow-canvas`."
        );
        assert_eq!(
            SketchError::AssetNotFound("earth.jpg".into()).to_string(),
            "Asset not found: earth.jpg"
        );
        let unknown = SketchError::UnknownSketch("cube".into(), "triangle, pyramid".into());
        assert_eq!(unknown.to_string(), "Unknown sketch `cube`. Expected one of: triangle, pyramid");
    }

    #[test]
    fn domain_errors_survive_anyhow() {
        let err: anyhow::Error = SketchError::AdapterUnavailable("no webgl2".into()).into();
        assert!(matches!(
            err.downcast_ref::<SketchError>(),
            Some(SketchError::AdapterUnavailable(reason)) if reason == "no webgl2"
        ));
    }
}
