//! Stamps the binaries with the image version and the git revision.

use std::env;

use vergen_git2::Emitter;
use vergen_git2::Git2Builder;

const IMAGE_VERSION_VAR: &str = "VERSION";

fn main() {
    println!("cargo:rerun-if-env-changed={IMAGE_VERSION_VAR}");
    let image_version = env::var(IMAGE_VERSION_VAR).unwrap_or_else(|_| "latest".to_string());
    println!("cargo:rustc-env=IMAGE_VERSION={image_version}");

    // outside a git checkout the VERGEN_GIT_* variables stay unset
    if let Err(err) = emit_git_revision() {
        println!("cargo:warning=git revision unavailable: {err}");
    }
}

fn emit_git_revision() -> anyhow::Result<()> {
    let git = Git2Builder::default()
        .branch(true)
        .sha(true)
        .dirty(true)
        .build()?;

    Emitter::default()
        .fail_on_error()
        .add_instructions(&git)?
        .emit()
}
