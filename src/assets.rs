//! Prepared image assets: the only place render inputs touch the filesystem.
//!
//! Decoding happens up front, before preview or export; renderers consume
//! prepared premultiplied RGBA8 pixels only. That keeps every render call pure
//! and frame-reproducible.

use std::{collections::BTreeMap, path::Path};

use crate::{
    error::{ScenemarkError, ScenemarkResult},
    model::{ScenePayload, Timeline},
    raster,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major.
    pub data: Vec<u8>,
}

/// Decoded images keyed by their `source` attribute.
#[derive(Clone, Debug, Default)]
pub struct PreparedAssets {
    images: BTreeMap<String, PreparedImage>,
}

impl PreparedAssets {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode every image source referenced by the timeline, relative to
    /// `root` (typically the document's directory).
    pub fn prepare(timeline: &Timeline, root: &Path) -> ScenemarkResult<Self> {
        let mut images = BTreeMap::new();
        for scene in timeline.scenes() {
            let ScenePayload::Image { source, .. } = &scene.payload else {
                continue;
            };
            if source.is_empty() || images.contains_key(source) {
                continue;
            }
            validate_source_path(source)?;

            let decoded = image::open(root.join(source)).map_err(|e| {
                ScenemarkError::validation(format!("failed to load image '{source}': {e}"))
            })?;
            let rgba = decoded.to_rgba8();
            let (width, height) = rgba.dimensions();
            let mut data = rgba.into_raw();
            for px in data.chunks_exact_mut(4) {
                let p = raster::premultiply([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&p);
            }

            images.insert(
                source.clone(),
                PreparedImage {
                    width,
                    height,
                    data,
                },
            );
        }
        Ok(Self { images })
    }

    pub fn insert_image(&mut self, source: impl Into<String>, image: PreparedImage) {
        self.images.insert(source.into(), image);
    }

    pub fn image(&self, source: &str) -> Option<&PreparedImage> {
        self.images.get(source)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Source paths must be relative, use `/` separators, and stay inside the
/// document root.
fn validate_source_path(source: &str) -> ScenemarkResult<()> {
    if source.starts_with('/') || source.contains('\\') {
        return Err(ScenemarkError::validation(format!(
            "image source '{source}' must be a relative path with '/' separators"
        )));
    }
    if source.split('/').any(|part| part == "..") {
        return Err(ScenemarkError::validation(format!(
            "image source '{source}' must not contain '..'"
        )));
    }
    Ok(())
}
