//! Type catalog built from the parameters file.

use super::alphabet::Alphabet;
use super::model_type::ModelType;
use super::topology::NetworkTopology;
use crate::core::config::{ModelParams, ParamsFile};
use crate::core::errors::{OCRError, OcrResult};
use crate::processors::letterbox::LetterboxParams;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Everything the recognizer needs to run one type.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub model_type: ModelType,
    /// NHWC shape of the network input, batch included.
    pub input_shape: [usize; 4],
    pub preprocessing: LetterboxParams,
    pub blank_index: usize,
    pub alphabet: Alphabet,
    pub topology: NetworkTopology,
    /// Model JSON holding the weight manifest.
    pub model_path: PathBuf,
    pub ctc_input_length: Option<usize>,
    pub max_label_length: Option<usize>,
}

impl CatalogEntry {
    /// Builds the entry of `model_type` from its parameters.
    pub fn from_params(model_type: ModelType, params: &ModelParams) -> OcrResult<Self> {
        let alphabet = Alphabet::new(params.symbols(model_type.as_str())?)?;
        let preprocessing = LetterboxParams {
            width: params.width,
            height: params.height,
            channels: params.net_channels,
            fill_color: params.fill_color,
        };

        Ok(Self {
            model_type,
            input_shape: preprocessing.input_shape(),
            preprocessing,
            blank_index: alphabet.blank_index(),
            alphabet,
            topology: NetworkTopology::for_type(model_type),
            model_path: params.model_path.clone(),
            ctc_input_length: params.ctc_input_length,
            max_label_length: params.max_label_length,
        })
    }

    /// Number of classes the network is expected to emit.
    pub fn output_classes(&self) -> usize {
        self.topology.output_classes(self.alphabet.len())
    }

    /// Sequence length the network should emit.
    ///
    /// `ctc_input_length` from the parameters wins over the topology's own
    /// value.
    pub fn expected_time_steps(&self) -> Option<usize> {
        self.ctc_input_length.or(self.topology.expected_time_steps())
    }

    /// Compares the emitted sequence length against
    /// [`CatalogEntry::expected_time_steps`].
    pub fn check_time_steps(&self, actual: usize) -> Option<LengthViolation> {
        self.expected_time_steps()
            .filter(|&expected| expected != actual)
            .map(|expected| LengthViolation::TimeSteps { expected, actual })
    }

    /// Lists the decoded samples longer than `max_label_length`.
    pub fn check_label_lengths(&self, sequences: &[Vec<usize>]) -> Vec<LengthViolation> {
        let Some(max) = self.max_label_length else {
            return Vec::new();
        };
        sequences
            .iter()
            .enumerate()
            .filter(|(_, sequence)| sequence.len() > max)
            .map(|(sample, sequence)| LengthViolation::LabelLength {
                sample,
                length: sequence.len(),
                max,
            })
            .collect()
    }
}

/// A run whose lengths disagree with its catalog entry.
///
/// These are reported as warnings; decoding still succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthViolation {
    TimeSteps {
        expected: usize,
        actual: usize,
    },
    LabelLength {
        sample: usize,
        length: usize,
        max: usize,
    },
}

impl fmt::Display for LengthViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthViolation::TimeSteps { expected, actual } => write!(
                f,
                "network emitted {} timesteps but {} were expected",
                actual, expected
            ),
            LengthViolation::LabelLength { sample, length, max } => write!(
                f,
                "sample {} decoded {} labels, more than max_label_length {}",
                sample, length, max
            ),
        }
    }
}

/// Read-only map from type to [`CatalogEntry`].
///
/// Types whose configuration is missing or malformed are remembered with
/// the reason, so resolving them reports a configuration error instead of
/// an unknown type.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: BTreeMap<ModelType, CatalogEntry>,
    unavailable: BTreeMap<ModelType, String>,
}

impl ModelCatalog {
    /// Builds the catalog of every registered type from `params`.
    pub fn from_params(params: &ParamsFile) -> Self {
        let mut catalog = Self::default();

        for name in params.type_names() {
            if name.parse::<ModelType>().is_err() {
                tracing::warn!("Ignoring parameters for unregistered type '{}'", name);
            }
        }

        for model_type in ModelType::ALL {
            let name = model_type.as_str();
            if !params.contains(name) {
                catalog.unavailable.insert(
                    model_type,
                    format!("type '{}' has no entry in the parameters file", name),
                );
                continue;
            }
            match params
                .entry(name)
                .and_then(|p| CatalogEntry::from_params(model_type, &p))
            {
                Ok(entry) => {
                    catalog.entries.insert(model_type, entry);
                }
                Err(e) => {
                    tracing::warn!("Type '{}' is unavailable: {}", name, e);
                    catalog.unavailable.insert(model_type, e.to_string());
                }
            }
        }

        tracing::debug!(
            "Catalog built with {} of {} types",
            catalog.entries.len(),
            ModelType::ALL.len()
        );
        catalog
    }

    /// Reads a parameters file and builds its catalog.
    pub fn from_path(path: impl AsRef<Path>) -> OcrResult<Self> {
        Ok(Self::from_params(&ParamsFile::from_path(path)?))
    }

    /// Adds or replaces the entry of its type.
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.unavailable.remove(&entry.model_type);
        self.entries.insert(entry.model_type, entry);
    }

    /// Looks up a type by its configuration key.
    pub fn resolve(&self, type_name: &str) -> OcrResult<&CatalogEntry> {
        let model_type: ModelType = type_name.parse()?;
        self.get(model_type).ok_or_else(|| {
            let reason = self
                .unavailable
                .get(&model_type)
                .cloned()
                .unwrap_or_else(|| format!("type '{}' is not configured", type_name));
            OCRError::config_error(reason)
        })
    }

    /// Returns the entry of `model_type`, if configured.
    pub fn get(&self, model_type: ModelType) -> Option<&CatalogEntry> {
        self.entries.get(&model_type)
    }

    /// Returns the configured types.
    pub fn types(&self) -> impl Iterator<Item = ModelType> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &str = r#"
models:
  type1:
    width: 128
    height: 64
    net_chanels: 1
    letters: "0123456789"
    model_path: data/models/type1/model.json
    ctc_input_length: 30
    max_label_length: 6
  type8:
    width: 200
    height: 50
    net_channels: 3
    letters: "abc$$"
    model_path: data/models/type8/model.json
  type4:
    width: 200
  recaptcha:
    width: 224
    height: 224
    net_channels: 3
    classes: ["bicycle", "bus", "car"]
    model_path: data/models/recaptcha/model.json
  type42:
    width: 1
"#;

    fn catalog() -> ModelCatalog {
        ModelCatalog::from_params(&ParamsFile::parse(PARAMS).unwrap())
    }

    #[test]
    fn test_resolve_configured_type() {
        let catalog = catalog();
        let entry = catalog.resolve("type1").unwrap();
        assert_eq!(entry.input_shape, [1, 64, 128, 1]);
        assert_eq!(entry.blank_index, 10);
        assert_eq!(entry.output_classes(), 11);
        assert_eq!(entry.ctc_input_length, Some(30));
        assert_eq!(entry.preprocessing.fill_color, 255);
    }

    #[test]
    fn test_dollar_escape_in_alphabet() {
        let catalog = catalog();
        let entry = catalog.resolve("type8").unwrap();
        assert_eq!(entry.alphabet.len(), 4);
        assert_eq!(entry.alphabet.decode([3]), "$");
    }

    #[test]
    fn test_classifier_entry() {
        let catalog = catalog();
        let entry = catalog.resolve("recaptcha").unwrap();
        assert!(entry.topology.is_classifier());
        assert_eq!(entry.output_classes(), 3);
        assert_eq!(entry.blank_index, 3);
    }

    #[test]
    fn test_unknown_type() {
        let catalog = catalog();
        assert!(matches!(
            catalog.resolve("type2"),
            Err(OCRError::UnknownType { .. })
        ));
        assert!(matches!(
            catalog.resolve("type42"),
            Err(OCRError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_known_but_unconfigured_type() {
        let catalog = catalog();
        let err = catalog.resolve("type5").unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
        assert!(err.to_string().contains("no entry"));
    }

    #[test]
    fn test_malformed_entry_is_config_error() {
        let catalog = catalog();
        let err = catalog.resolve("type4").unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
        assert!(catalog.resolve("type1").is_ok());
        assert_eq!(catalog.types().count(), 3);
    }

    #[test]
    fn test_time_steps_prefer_params_over_topology() {
        let catalog = catalog();
        let type1 = catalog.resolve("type1").unwrap();
        assert_eq!(type1.expected_time_steps(), Some(30));
        assert_eq!(type1.check_time_steps(30), None);
        assert_eq!(
            type1.check_time_steps(32),
            Some(LengthViolation::TimeSteps {
                expected: 30,
                actual: 32
            })
        );

        let type8 = catalog.resolve("type8").unwrap();
        assert_eq!(type8.ctc_input_length, None);
        assert_eq!(type8.expected_time_steps(), Some(24));
        assert!(type8.check_time_steps(25).is_some());
    }

    #[test]
    fn test_label_length_violations() {
        let catalog = catalog();
        let type1 = catalog.resolve("type1").unwrap();
        let sequences = vec![vec![1; 6], vec![2; 7], vec![]];
        let violations = type1.check_label_lengths(&sequences);
        assert_eq!(
            violations,
            vec![LengthViolation::LabelLength {
                sample: 1,
                length: 7,
                max: 6
            }]
        );
        assert!(violations[0].to_string().contains("max_label_length 6"));

        let type8 = catalog.resolve("type8").unwrap();
        assert!(type8.check_label_lengths(&sequences).is_empty());
    }
}
