//! Weight manifests and their binary shards.
//!
//! A model JSON file carries a `weightsManifest` array of groups. Each group
//! lists the shard files it was split into and the tensors packed inside
//! them. Concatenating every shard in manifest order yields the serialized
//! network.

use crate::core::constants::WEIGHTS_KEY;
use crate::core::errors::{OCRError, OcrResult, SimpleError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One tensor described by a manifest group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSpec {
    /// Tensor name.
    pub name: String,
    /// Tensor shape.
    #[serde(default)]
    pub shape: Vec<usize>,
    /// Element type, e.g. `float32`.
    #[serde(default)]
    pub dtype: Option<String>,
}

/// A group of shards stored together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightGroup {
    /// Shard file names, relative to the shards prefix.
    pub paths: Vec<String>,
    /// Tensors packed into the shards.
    #[serde(default)]
    pub weights: Vec<WeightSpec>,
}

/// The weight manifest of a model file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeightsManifest {
    source: PathBuf,
    groups: Vec<WeightGroup>,
}

impl WeightsManifest {
    /// Reads the manifest embedded in the model JSON at `path`.
    pub fn from_model_file(path: impl AsRef<Path>) -> OcrResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OCRError::model_load_error(
                path,
                "model file not readable",
                Some("check model_path in the parameters file"),
                Some(e),
            )
        })?;
        Self::parse(&contents, path)
    }

    /// Parses a model JSON document. `source` is only used in error messages.
    pub fn parse(contents: &str, source: &Path) -> OcrResult<Self> {
        let mut document: serde_json::Value = serde_json::from_str(contents).map_err(|e| {
            OCRError::model_load_error(source, "model file is not valid JSON", None, Some(e))
        })?;

        let manifest = document
            .get_mut(WEIGHTS_KEY)
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                OCRError::model_load_error(
                    source,
                    format!("model file has no '{}' key", WEIGHTS_KEY),
                    None,
                    None::<SimpleError>,
                )
            })?;

        let groups: Vec<WeightGroup> = serde_json::from_value(manifest).map_err(|e| {
            OCRError::model_load_error(source, "malformed weight manifest", None, Some(e))
        })?;

        if groups.iter().all(|group| group.paths.is_empty()) {
            return Err(OCRError::model_load_error(
                source,
                "weight manifest lists no shards",
                None,
                None::<SimpleError>,
            ));
        }

        Ok(Self {
            source: source.to_path_buf(),
            groups,
        })
    }

    /// Returns the manifest groups in order.
    pub fn groups(&self) -> &[WeightGroup] {
        &self.groups
    }

    /// Returns the number of tensors described by the manifest.
    pub fn tensor_count(&self) -> usize {
        self.groups.iter().map(|group| group.weights.len()).sum()
    }

    /// Resolves every shard path against `prefix`, in manifest order.
    pub fn shard_paths(&self, prefix: &Path) -> Vec<PathBuf> {
        self.groups
            .iter()
            .flat_map(|group| group.paths.iter())
            .map(|shard| prefix.join(shard))
            .collect()
    }

    /// Reads and concatenates every shard under `prefix`.
    pub fn read_shards(&self, prefix: &Path) -> OcrResult<Vec<u8>> {
        let mut bytes = Vec::new();
        for shard in self.shard_paths(prefix) {
            let chunk = std::fs::read(&shard).map_err(|e| {
                OCRError::model_load_error(
                    &shard,
                    "weight shard not readable",
                    Some("check the shards prefix"),
                    Some(e),
                )
            })?;
            if chunk.is_empty() {
                return Err(OCRError::model_load_error(
                    &shard,
                    "weight shard is empty",
                    None,
                    None::<SimpleError>,
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(
            "Read {} bytes of weights for '{}'",
            bytes.len(),
            self.source.display()
        );
        Ok(bytes)
    }
}
