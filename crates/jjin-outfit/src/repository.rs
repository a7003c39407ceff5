use std::sync::Arc;

use tracing::instrument;

use crate::client::OutfitClient;
use crate::error::{OutfitError, OutfitStage};
use crate::prompt;
use crate::types::OutfitResult;

/// Recommendation text followed by an illustration of it.
pub struct OutfitRepository {
    client: Arc<dyn OutfitClient>,
    unit_symbol: String,
}

impl OutfitRepository {
    pub fn new(client: Arc<dyn OutfitClient>, unit_symbol: impl Into<String>) -> Self {
        Self {
            client,
            unit_symbol: unit_symbol.into(),
        }
    }

    /// Both calls must succeed; a failure in either is reported as a whole.
    #[instrument(skip(self), level = "info")]
    pub async fn get_outfit(
        &self,
        temperature: i32,
        summary: &str,
    ) -> Result<OutfitResult, OutfitError> {
        if !self.client.is_configured() {
            return Err(OutfitError::MissingApiKey);
        }

        let recommendation = self
            .client
            .complete(
                prompt::STYLIST_SYSTEM_PROMPT,
                &prompt::recommendation_prompt(temperature, &self.unit_symbol, summary),
            )
            .await
            .map_err(OutfitError::at(OutfitStage::Recommendation))?;

        let image_url = self
            .client
            .generate_image(&prompt::image_prompt(&recommendation))
            .await
            .map_err(OutfitError::at(OutfitStage::Image))?;

        tracing::info!("Outfit recommendation ready");
        Ok(OutfitResult {
            recommendation,
            image_url,
        })
    }
}
