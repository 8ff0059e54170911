//! Build script for the spotharvest CLI.
//!
//! Copies the `.env.example` template from the crate root into the user's
//! local data directory so a fresh install has a configuration skeleton in
//! the place `config::load_env` looks for it:
//!
//! - Linux: `~/.local/share/spotharvest/.env.example`
//! - macOS: `~/Library/Application Support/spotharvest/.env.example`
//! - Windows: `%LOCALAPPDATA%/spotharvest/.env.example`
//!
//! A missing template only produces a cargo warning. Failing to create the
//! directory or write the copy fails the build.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotharvest");
    fs::create_dir_all(&out_dir)?;

    if template.is_file() {
        fs::copy(&template, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
    }

    Ok(())
}
