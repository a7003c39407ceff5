//! Outfit-specific error types.

use std::fmt;

use jjin_core::NetworkError;
use thiserror::Error;

/// Which of the two dependent calls failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutfitStage {
    Recommendation,
    Image,
}

impl fmt::Display for OutfitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recommendation => f.write_str("recommendation"),
            Self::Image => f.write_str("image"),
        }
    }
}

#[derive(Error, Debug)]
pub enum OutfitError {
    #[error("Outfit {stage} request failed: {source}")]
    OutfitFetchFailed {
        stage: OutfitStage,
        #[source]
        source: NetworkError,
    },

    #[error("OpenAI API key is not configured")]
    MissingApiKey,
}

impl OutfitError {
    pub(crate) fn at(stage: OutfitStage) -> impl FnOnce(NetworkError) -> Self {
        move |source| Self::OutfitFetchFailed { stage, source }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::OutfitFetchFailed { source, .. } => {
                format!("Couldn't get an outfit suggestion. {}", source.user_message())
            }
            Self::MissingApiKey => {
                "Outfit suggestions need an OpenAI API key. Add one to your settings.".to_string()
            }
        }
    }
}
