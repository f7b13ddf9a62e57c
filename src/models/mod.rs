// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model management module for FT-CORE.
//!
//! Handles model loading, registry tracking, and manifest-driven preloading.

pub mod manifest;

mod handle;
mod loader;
mod preload;
mod registry;

pub use handle::{ModelHandle, ModelInfo, ModelMetadata};
pub use loader::{LoadError, MappedModel, ModelLoader, ModelPath};
pub use manifest::{ManifestEntry, ManifestError, PreloadManifest};
pub use preload::{ModelPreloader, PreloadError};
pub use registry::ModelRegistry;
