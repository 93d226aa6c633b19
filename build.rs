use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Sketch textures and the asteroid mesh live in ./assets. They are optional, every
// sketch falls back to generated data when a file is missing.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");
    println!("cargo:rerun-if-env-changed=FLOW_SKETCHES_ASSETS");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], out_dir, &copy_options)?;

    Ok(())
}
