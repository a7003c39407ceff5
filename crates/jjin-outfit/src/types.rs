use serde::{Deserialize, Serialize};

/// A recommendation and its illustration. Never partially populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitResult {
    pub recommendation: String,
    pub image_url: String,
}
