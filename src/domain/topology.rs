//! Network topologies as data.
//!
//! Layer definitions live inside the serialized graphs. What the pipeline
//! needs from a topology is its shape contract: how many timesteps the
//! recurrent head sees and how many classes the output layer emits.

use super::model_type::ModelType;
use crate::core::constants::DENSENET_BLOCKS;

/// Feature extractor in front of the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backbone {
    /// Seven conv layers with max pooling, squeezed along the height axis.
    ConvStack,
    /// DenseNet with the given dense block sizes.
    DenseNet {
        blocks: [usize; 4],
        /// Filters of the extra convolution applied before the reshape.
        extra_conv_filters: Option<usize>,
    },
}

/// Output head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Head {
    /// Two stacked bidirectional GRUs followed by a softmax over
    /// `alphabet + blank`.
    Recurrent {
        /// `(timesteps, features)` of the reshape feeding the GRUs, when the
        /// backbone output is reshaped.
        reshape: Option<(usize, usize)>,
        units: usize,
    },
    /// Global pooling, two dense layers and a softmax over the classes.
    Classifier { hidden_units: usize },
}

/// Description of a network's structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkTopology {
    pub backbone: Backbone,
    pub head: Head,
}

impl NetworkTopology {
    /// Returns the topology registered for `model_type`.
    pub fn for_type(model_type: ModelType) -> Self {
        let densenet = Backbone::DenseNet {
            blocks: DENSENET_BLOCKS,
            extra_conv_filters: None,
        };
        let recurrent = |rows, features| Head::Recurrent {
            reshape: Some((rows, features)),
            units: 256,
        };

        match model_type {
            ModelType::Type1 => Self {
                backbone: Backbone::ConvStack,
                head: Head::Recurrent {
                    reshape: None,
                    units: 128,
                },
            },
            ModelType::Type3 => Self {
                backbone: densenet,
                head: recurrent(48, 128),
            },
            ModelType::Type4 => Self {
                backbone: densenet,
                head: recurrent(12, 512),
            },
            ModelType::Type5 => Self {
                backbone: Backbone::DenseNet {
                    blocks: DENSENET_BLOCKS,
                    extra_conv_filters: Some(1024),
                },
                head: recurrent(16, 256),
            },
            ModelType::Type6 | ModelType::Type7 | ModelType::Type8 => Self {
                backbone: densenet,
                head: recurrent(24, 128),
            },
            ModelType::Recaptcha => Self {
                backbone: densenet,
                head: Head::Classifier { hidden_units: 128 },
            },
        }
    }

    /// Returns true if the network emits one distribution per image.
    pub fn is_classifier(&self) -> bool {
        matches!(self.head, Head::Classifier { .. })
    }

    /// Number of timesteps the decoder will see, when fixed by the topology.
    ///
    /// The conv stack's sequence length follows the input width, so it has
    /// no fixed value.
    pub fn expected_time_steps(&self) -> Option<usize> {
        match self.head {
            Head::Recurrent {
                reshape: Some((rows, _)),
                ..
            } => Some(rows),
            Head::Recurrent { reshape: None, .. } => None,
            Head::Classifier { .. } => Some(1),
        }
    }

    /// Number of output units for an alphabet of `alphabet_len` symbols.
    pub fn output_classes(&self, alphabet_len: usize) -> usize {
        if self.is_classifier() {
            alphabet_len
        } else {
            alphabet_len + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_heads_reserve_blank() {
        let topology = NetworkTopology::for_type(ModelType::Type8);
        assert!(!topology.is_classifier());
        assert_eq!(topology.output_classes(36), 37);
        assert_eq!(topology.expected_time_steps(), Some(24));
    }

    #[test]
    fn test_reshape_rows_per_type() {
        let rows: Vec<Option<usize>> = ModelType::ALL
            .iter()
            .map(|t| NetworkTopology::for_type(*t).expected_time_steps())
            .collect();
        assert_eq!(
            rows,
            vec![
                None,
                Some(48),
                Some(12),
                Some(16),
                Some(24),
                Some(24),
                Some(24),
                Some(1)
            ]
        );
    }

    #[test]
    fn test_recaptcha_is_classifier() {
        let topology = NetworkTopology::for_type(ModelType::Recaptcha);
        assert!(topology.is_classifier());
        assert_eq!(topology.output_classes(12), 12);
    }

    #[test]
    fn test_type5_has_extra_conv() {
        let topology = NetworkTopology::for_type(ModelType::Type5);
        assert_eq!(
            topology.backbone,
            Backbone::DenseNet {
                blocks: DENSENET_BLOCKS,
                extra_conv_filters: Some(1024)
            }
        );
    }
}
