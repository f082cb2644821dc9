//! End-to-end recognition of a captcha image.

use super::stage::StageTracker;
use crate::core::batch::{Tensor2D, Tensor3D, TensorD};
use crate::core::cancel::CancellationFlag;
use crate::core::config::{ConfigValidatorExt, RecognizerConfig};
use crate::core::errors::{OCRError, OcrResult};
use crate::core::inference::{ModelLoader, OrtModelLoader, check_input_shape};
use crate::domain::{CatalogEntry, ModelCatalog, ModelType};
use crate::processors::ctc::{CtcDecoder, CtcGreedyDecoder, SparseLabelBatch};
use crate::processors::{letterbox, log_scores};
use crate::utils::load_image;
use std::path::{Path, PathBuf};

/// Result of a recognition run.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub model_type: ModelType,
    /// Decoded text of every sample, in sparse order.
    pub text: String,
    /// Decoded class indices.
    pub batch: SparseLabelBatch,
    /// Cumulative negative log score per sample.
    pub log_probability: Tensor2D,
}

/// One `(type, image, shards)` request for [`Recognizer::run_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionJob {
    pub type_name: String,
    pub image_path: PathBuf,
    pub shards_prefix: PathBuf,
}

impl RecognitionJob {
    pub fn new(
        type_name: impl Into<String>,
        image_path: impl Into<PathBuf>,
        shards_prefix: impl Into<PathBuf>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            image_path: image_path.into(),
            shards_prefix: shards_prefix.into(),
        }
    }
}

/// Runs catalog lookup, preprocessing, inference and CTC decoding for a
/// captcha type.
///
/// A run either returns the full text or fails; no partial text is ever
/// returned. Weights are loaded for every run and released with it.
pub struct Recognizer {
    catalog: ModelCatalog,
    config: RecognizerConfig,
    loader: Box<dyn ModelLoader>,
    cancel: CancellationFlag,
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("catalog", &self.catalog)
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Recognizer {
    /// Creates a recognizer backed by ONNX Runtime.
    pub fn new(catalog: ModelCatalog, config: RecognizerConfig) -> OcrResult<Self> {
        let config = config.validate_and_wrap_ocr_error()?;
        let loader = OrtModelLoader::from_config(&config);
        Ok(Self {
            catalog,
            config,
            loader: Box::new(loader),
            cancel: CancellationFlag::new(),
        })
    }

    /// Replaces the network loader.
    pub fn with_loader(mut self, loader: impl ModelLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Shares `cancel` with the caller so it can abort runs.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the cancellation flag polled by this recognizer.
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Recognizes the text in `image_path` with the network of `type_name`.
    pub fn run(
        &self,
        type_name: &str,
        image_path: impl AsRef<Path>,
        shards_prefix: impl AsRef<Path>,
    ) -> OcrResult<String> {
        self.run_detailed(type_name, image_path, shards_prefix)
            .map(|recognition| recognition.text)
    }

    /// Like [`Recognizer::run`] but also returns the decoder output.
    pub fn run_detailed(
        &self,
        type_name: &str,
        image_path: impl AsRef<Path>,
        shards_prefix: impl AsRef<Path>,
    ) -> OcrResult<Recognition> {
        let image_path = image_path.as_ref();
        let mut tracker = StageTracker::new(&self.cancel);
        let result = self.execute(
            &mut tracker,
            type_name,
            image_path,
            shards_prefix.as_ref(),
        );

        match &result {
            Ok(recognition) => {
                tracing::info!(
                    "Decoded '{}' from {} ({})",
                    recognition.text,
                    image_path.display(),
                    type_name
                );
            }
            Err(e) => {
                let stage = tracker
                    .fail()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                if e.is_cancelled() {
                    tracing::warn!("Recognition of {} cancelled: {}", image_path.display(), e);
                } else {
                    tracing::error!(
                        "Recognition of {} ({}) failed during {}: {}",
                        image_path.display(),
                        type_name,
                        stage,
                        e
                    );
                }
            }
        }
        result
    }

    /// Runs `jobs` in order and returns one result per job.
    pub fn run_all(&self, jobs: &[RecognitionJob]) -> Vec<OcrResult<String>> {
        jobs.iter()
            .map(|job| self.run(&job.type_name, &job.image_path, &job.shards_prefix))
            .collect()
    }

    fn execute(
        &self,
        tracker: &mut StageTracker<'_>,
        type_name: &str,
        image_path: &Path,
        shards_prefix: &Path,
    ) -> OcrResult<Recognition> {
        tracker.begin()?;
        let entry = self.catalog.resolve(type_name)?;
        tracker.complete();

        tracker.begin()?;
        let input = {
            let image = load_image(image_path)?;
            letterbox::preprocess(&image, &entry.preprocessing)?
        };
        tracker.complete();

        tracker.begin()?;
        let model = self.loader.load(
            entry.model_type.as_str(),
            &entry.model_path,
            shards_prefix,
        )?;
        if let Some(declared) = model.input_shape() {
            check_input_shape(&entry.model_path, &declared, &entry.input_shape)?;
        }
        tracker.complete();

        tracker.begin()?;
        let raw = model.forward(&input)?;
        drop(input);
        drop(model);
        let scores = self.to_log_scores(entry, raw)?;
        tracker.complete();

        tracker.begin()?;
        let (max_time, batch_size, _) = scores.dim();
        let valid_lengths = vec![max_time; batch_size];
        let output = self.decoder(entry).decode(scores.view(), &valid_lengths)?;
        drop(scores);
        tracker.complete();

        tracker.begin()?;
        for violation in entry.check_label_lengths(&output.batch.to_sequences()?) {
            tracing::warn!("{} ({})", violation, entry.model_type);
        }
        let text = entry.alphabet.decode(output.batch.values.iter().copied());
        tracker.complete();

        Ok(Recognition {
            model_type: entry.model_type,
            text,
            batch: output.batch,
            log_probability: output.log_probability,
        })
    }

    fn to_log_scores(&self, entry: &CatalogEntry, raw: TensorD) -> OcrResult<Tensor3D> {
        if self.config.debug {
            tracing::debug!("Raw prediction {:?}: {:?}", raw.shape(), raw);
        }

        let classes = raw.shape().last().copied().unwrap_or(0);
        if classes != entry.output_classes() {
            return Err(OCRError::shape_mismatch(
                "network output classes",
                &[entry.output_classes()],
                &[classes],
            ));
        }

        if entry.topology.is_classifier() {
            return log_scores::classifier_log_scores(raw);
        }

        let probabilities = log_scores::expand_batch(raw)?;
        if let Some(violation) = entry.check_time_steps(probabilities.dim().1) {
            tracing::warn!("{} ({})", violation, entry.model_type);
        }
        Ok(log_scores::time_major_log_scores(&probabilities))
    }

    fn decoder(&self, entry: &CatalogEntry) -> CtcGreedyDecoder {
        CtcGreedyDecoder::new(self.config.merge_repeated)
            .with_debug(self.config.debug)
            .with_blank_index(entry.blank_index)
            .with_parallel_threshold(self.config.effective_parallel_threshold())
            .with_cancellation(self.cancel.clone())
    }
}

/// Recognizes one image with default options.
///
/// Reads the parameters file at `config_path`, loads the network of
/// `type_name` from its manifest and the shards under `shards_prefix`, and
/// returns the decoded text.
pub fn recognize(
    type_name: &str,
    config_path: impl AsRef<Path>,
    image_path: impl AsRef<Path>,
    shards_prefix: impl AsRef<Path>,
) -> OcrResult<String> {
    let catalog = ModelCatalog::from_path(config_path)?;
    Recognizer::new(catalog, RecognizerConfig::default())?.run(
        type_name,
        image_path,
        shards_prefix,
    )
}
