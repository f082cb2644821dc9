//! Registered captcha types.

use crate::core::errors::OCRError;
use std::fmt;
use std::str::FromStr;

/// A captcha family with its own network and preprocessing geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelType {
    Type1,
    Type3,
    Type4,
    Type5,
    Type6,
    Type7,
    Type8,
    /// Whole-image classifier for reCAPTCHA tiles.
    Recaptcha,
}

impl ModelType {
    /// Every registered type, in registry order.
    pub const ALL: [ModelType; 8] = [
        ModelType::Type1,
        ModelType::Type3,
        ModelType::Type4,
        ModelType::Type5,
        ModelType::Type6,
        ModelType::Type7,
        ModelType::Type8,
        ModelType::Recaptcha,
    ];

    /// Returns the configuration key of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Type1 => "type1",
            ModelType::Type3 => "type3",
            ModelType::Type4 => "type4",
            ModelType::Type5 => "type5",
            ModelType::Type6 => "type6",
            ModelType::Type7 => "type7",
            ModelType::Type8 => "type8",
            ModelType::Recaptcha => "recaptcha",
        }
    }

    /// Returns the configuration keys of every registered type.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(ModelType::as_str).collect()
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = OCRError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OCRError::unknown_type(s, &Self::names()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for model_type in ModelType::ALL {
            assert_eq!(model_type.as_str().parse::<ModelType>().unwrap(), model_type);
        }
    }

    #[test]
    fn test_type2_is_unknown() {
        let err = "type2".parse::<ModelType>().unwrap_err();
        assert!(matches!(err, OCRError::UnknownType { .. }));
        assert!(err.to_string().contains("recaptcha"));
    }
}
