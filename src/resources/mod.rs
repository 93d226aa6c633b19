//! Loading of everything that lives outside the binary: strings, raw bytes, textures
//! and `.obj` models, plus the upload of procedural [`crate::geometry::MeshData`].
//!
//! Natively files are read from `./assets` or from the directory named by
//! `FLOW_SKETCHES_ASSETS`. On the web they are fetched from `<origin>/assets/`.

use std::io::{BufReader, Cursor};

use anyhow::Context as _;

use crate::{
    data_structures::model,
    resources::texture::{default_material, diffuse_normal_layout},
};

pub mod mesh;
pub mod pick;
pub mod texture;

/// Environment variable overriding the native asset directory.
pub const ASSETS_ENV: &str = "FLOW_SKETCHES_ASSETS";

#[cfg(not(target_arch = "wasm32"))]
pub fn asset_path(file_name: &str) -> std::path::PathBuf {
    let root = std::env::var_os(ASSETS_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::Path::new("./").join("assets"));
    root.join(file_name)
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Cannot read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

/// Path of `relative` next to `file_name`, e.g. the `.mtl` an `.obj` refers to.
pub fn sibling(file_name: &str, relative: &str) -> String {
    match file_name.rfind('/') {
        Some(idx) => format!("{}/{}", &file_name[..idx], relative),
        None => relative.to_string(),
    }
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let data = load_binary(file_name).await?;
    String::from_utf8(data).with_context(|| format!("{file_name} is not valid UTF-8"))
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(crate::error::SketchError::AssetNotFound(file_name.to_string()).into());
        }
        response.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_path(file_name);
        match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(
                    crate::error::SketchError::AssetNotFound(path.display().to_string()).into(),
                );
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    };

    Ok(data)
}

/// Loads an `.obj` file with its `.mtl` materials.
///
/// A missing or broken material library is not fatal: the model is drawn with a plain
/// white material instead.
pub async fn load_model_obj(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<model::Model> {
    let bind_group_layout = diffuse_normal_layout(device);

    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            match load_string(&sibling(file_name, &p)).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(e) => {
                    log::warn!("Material library {p} for {file_name} could not be loaded: {e}");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await
    .with_context(|| format!("Failed to parse {file_name}"))?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("{file_name} is drawn without its materials: {e}");
        Vec::new()
    });
    let mut materials = texture::load_materials(
        file_name,
        &obj_materials,
        device,
        queue,
        &bind_group_layout,
    )
    .await;
    if materials.is_empty() {
        materials.push(default_material(device, queue, file_name));
    }

    let meshes = mesh::load_meshes(&models, file_name, device);
    if meshes.is_empty() {
        return Err(crate::error::SketchError::AssetNotFound(format!(
            "{file_name} contains no drawable mesh"
        ))
        .into());
    }

    Ok(model::Model { meshes, materials })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_libraries_resolve_next_to_the_model() {
        assert_eq!(
            sibling("planets/asteroid.obj", "asteroid.mtl"),
            "planets/asteroid.mtl"
        );
        assert_eq!(sibling("asteroid.obj", "asteroid.mtl"), "asteroid.mtl");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_assets_are_reported_as_such() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let err = rt
            .block_on(load_binary("definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::SketchError>(),
            Some(crate::error::SketchError::AssetNotFound(_))
        ));
    }
}
