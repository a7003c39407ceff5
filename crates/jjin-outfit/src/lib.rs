//! Outfit recommendations for JJin Weather
//!
//! Asks an OpenAI chat model what to wear for a temperature and weather
//! summary, then renders that recommendation with an image model.

pub mod client;
pub mod error;
pub mod prompt;
pub mod repository;
pub mod types;

pub use client::{OpenAiClient, OutfitClient};
pub use error::{OutfitError, OutfitStage};
pub use repository::OutfitRepository;
pub use types::OutfitResult;
