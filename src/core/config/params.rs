//! YAML parameters file describing each recognizable type.
//!
//! A parameters file maps type names to their preprocessing geometry,
//! alphabet and model location:
//!
//! ```yaml
//! models:
//!   type1:
//!     width: 128
//!     height: 64
//!     net_channels: 1
//!     fill_color: 255
//!     letters: "0123456789"
//!     model_path: data/models/type1/model.json
//!     ctc_input_length: 30
//!     max_label_length: 6
//! ```
//!
//! Entries are parsed lazily so that one malformed entry only fails the
//! requests that use it.

use super::errors::ConfigError;
use crate::core::constants::PARAMS_ROOT_KEY;
use crate::core::errors::{OCRError, OcrResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn default_fill_color() -> u8 {
    255
}

/// Class names of a classifier network or the letters of a sequence network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassList {
    /// One symbol per character; `$$` stands for a literal `$`.
    Chars(String),
    /// One symbol per list item, for whole-word classes.
    Words(Vec<String>),
}

/// Parameters of a single type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Network input width in pixels.
    pub width: u32,
    /// Network input height in pixels.
    pub height: u32,
    /// Network input channels (1 for grayscale, 3 for color).
    #[serde(alias = "net_chanels")]
    pub net_channels: u32,
    /// Gray level used for letterbox padding.
    #[serde(default = "default_fill_color")]
    pub fill_color: u8,
    /// Alphabet of a sequence network.
    #[serde(default)]
    pub letters: Option<String>,
    /// Class names, used when `letters` is absent.
    #[serde(default)]
    pub classes: Option<ClassList>,
    /// Path to the model JSON holding the weight manifest.
    pub model_path: PathBuf,
    /// Sequence length the network was trained with.
    #[serde(default)]
    pub ctc_input_length: Option<usize>,
    /// Longest label seen during training.
    #[serde(default)]
    pub max_label_length: Option<usize>,
}

impl ModelParams {
    /// Returns the alphabet symbols of this entry, without the blank.
    ///
    /// `letters` takes precedence over `classes`. A letters string is split
    /// into one symbol per character after `$$` escapes are resolved.
    pub fn symbols(&self, entry: &str) -> OcrResult<Vec<String>> {
        let symbols = match (&self.letters, &self.classes) {
            (Some(letters), _) => split_chars(letters),
            (None, Some(ClassList::Chars(chars))) => split_chars(chars),
            (None, Some(ClassList::Words(words))) => words.clone(),
            (None, None) => {
                return Err(ConfigError::MissingField {
                    entry: entry.to_string(),
                    field: "letters".to_string(),
                }
                .into());
            }
        };

        if symbols.is_empty() {
            return Err(OCRError::config_error_with_context(
                entry,
                "letters",
                "alphabet is empty",
            ));
        }
        Ok(symbols)
    }

    /// Checks the geometry of the entry registered under `type_name`.
    pub fn validate_entry(&self, type_name: &str) -> Result<(), ConfigError> {
        let invalid = |field: &str, value: usize| ConfigError::InvalidDimension {
            entry: type_name.to_string(),
            field: field.to_string(),
            value,
        };
        if self.width == 0 {
            return Err(invalid("width", 0));
        }
        if self.height == 0 {
            return Err(invalid("height", 0));
        }
        if self.net_channels != 1 && self.net_channels != 3 {
            return Err(invalid("net_channels", self.net_channels as usize));
        }
        Ok(())
    }
}

/// Resolves `$$` escapes into literal `$` characters.
pub fn unescape_symbols(raw: &str) -> String {
    raw.replace("$$", "$")
}

fn split_chars(raw: &str) -> Vec<String> {
    unescape_symbols(raw).chars().map(String::from).collect()
}

/// A parsed parameters file.
#[derive(Debug, Clone, Default)]
pub struct ParamsFile {
    source: Option<PathBuf>,
    entries: BTreeMap<String, serde_yaml::Value>,
}

impl ParamsFile {
    /// Reads and parses a parameters file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> OcrResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OCRError::config_error(format!(
                "failed to read parameters file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut params = Self::parse(&contents)?;
        params.source = Some(path.to_path_buf());
        Ok(params)
    }

    /// Parses a parameters document.
    ///
    /// Entries are read from the `models` key when present, otherwise the
    /// document itself is taken as the type map.
    pub fn parse(contents: &str) -> OcrResult<Self> {
        let document: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let root = match document.get(PARAMS_ROOT_KEY) {
            Some(models) => models.clone(),
            None => document,
        };

        let mapping = match root {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            _ => {
                return Err(OCRError::config_error(
                    "parameters file must be a mapping of type names to entries",
                ));
            }
        };

        let mut entries = BTreeMap::new();
        for (key, value) in mapping {
            let name = key.as_str().ok_or_else(|| {
                OCRError::config_error(format!("type name must be a string, got {:?}", key))
            })?;
            entries.insert(name.to_string(), value);
        }

        Ok(Self {
            source: None,
            entries,
        })
    }

    /// Returns the file this configuration was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Returns the type names present in the file.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns true if the file has an entry for `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Parses and validates the entry for `type_name`.
    pub fn entry(&self, type_name: &str) -> OcrResult<ModelParams> {
        let value = self.entries.get(type_name).ok_or_else(|| {
            OCRError::config_error(format!(
                "no entry for type '{}' in parameters file{}",
                type_name,
                self.source
                    .as_ref()
                    .map(|p| format!(" '{}'", p.display()))
                    .unwrap_or_default()
            ))
        })?;

        let params: ModelParams = serde_yaml::from_value(value.clone()).map_err(|e| {
            OCRError::config_error_with_context(type_name, "entry", &e.to_string())
        })?;
        params.validate_entry(type_name)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
models:
  type1:
    width: 128
    height: 64
    net_chanels: 1
    fill_color: 255
    letters: "0123456789"
    model_path: data/models/type1/model.json
    ctc_input_length: 30
    max_label_length: 6
  recaptcha:
    width: 224
    height: 224
    net_channels: 3
    classes: ["bicycle", "bus", "car"]
    model_path: data/models/recaptcha/model.json
  type8:
    width: 200
    letters: "abc"
"#;

    #[test]
    fn test_parse_reads_models_key() {
        let params = ParamsFile::parse(SAMPLE).unwrap();
        let names: Vec<&str> = params.type_names().collect();
        assert_eq!(names, vec!["recaptcha", "type1", "type8"]);

        let type1 = params.entry("type1").unwrap();
        assert_eq!(type1.net_channels, 1);
        assert_eq!(type1.ctc_input_length, Some(30));
        assert_eq!(type1.symbols("type1").unwrap().len(), 10);
    }

    #[test]
    fn test_word_classes() {
        let params = ParamsFile::parse(SAMPLE).unwrap();
        let recaptcha = params.entry("recaptcha").unwrap();
        assert_eq!(recaptcha.fill_color, 255);
        assert_eq!(
            recaptcha.symbols("recaptcha").unwrap(),
            vec!["bicycle", "bus", "car"]
        );
    }

    #[test]
    fn test_malformed_entry_fails_alone() {
        let params = ParamsFile::parse(SAMPLE).unwrap();
        let err = params.entry("type8").unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
        assert!(err.to_string().contains("type8"));
        assert!(params.entry("type1").is_ok());
    }

    #[test]
    fn test_missing_entry_is_config_error() {
        let params = ParamsFile::parse(SAMPLE).unwrap();
        let err = params.entry("type5").unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }

    #[test]
    fn test_dollar_escape() {
        assert_eq!(unescape_symbols("ab$$c"), "ab$c");
        assert_eq!(split_chars("$$1"), vec!["$", "1"]);
    }

    #[test]
    fn test_document_without_models_key() {
        let params = ParamsFile::parse(
            "type3:\n  width: 96\n  height: 32\n  net_channels: 3\n  letters: ab\n  model_path: m.json\n",
        )
        .unwrap();
        assert!(params.contains("type3"));
        assert_eq!(params.entry("type3").unwrap().width, 96);
    }

    #[test]
    fn test_invalid_channel_count() {
        let params = ParamsFile::parse(
            "type3:\n  width: 96\n  height: 32\n  net_channels: 2\n  letters: ab\n  model_path: m.json\n",
        )
        .unwrap();
        assert!(params.entry("type3").is_err());
    }

    #[test]
    fn test_invalid_dimension_names_the_type() {
        let params = ParamsFile::parse(
            "type3:\n  width: 0\n  height: 32\n  net_channels: 3\n  letters: ab\n  model_path: data/models/type3/model.json\n",
        )
        .unwrap();
        let message = params.entry("type3").unwrap_err().to_string();
        assert!(message.contains("entry 'type3'"));
        assert!(message.contains("width"));
        assert!(!message.contains("data/models"));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let params = ParamsFile::from_path(file.path()).unwrap();
        assert_eq!(params.source(), Some(file.path()));
        assert!(ParamsFile::from_path("/nonexistent/params.yaml").is_err());
    }
}
