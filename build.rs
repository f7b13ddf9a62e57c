// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Writes `include/ft_core.h` when built with the `header` feature.

fn main() {
    println!("cargo:rerun-if-changed=src/ffi");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    #[cfg(feature = "header")]
    generate_header();
}

#[cfg(feature = "header")]
fn generate_header() {
    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let config = cbindgen::Config::from_file(format!("{}/cbindgen.toml", crate_dir))
        .unwrap_or_default();

    match cbindgen::generate_with_config(&crate_dir, config) {
        Ok(bindings) => {
            let include_dir = format!("{}/include", crate_dir);
            if let Err(e) = std::fs::create_dir_all(&include_dir) {
                println!("cargo:warning=cannot create {}: {}", include_dir, e);
                return;
            }
            bindings.write_to_file(format!("{}/ft_core.h", include_dir));
        }
        Err(e) => println!("cargo:warning=header generation failed: {}", e),
    }
}
