//! Prompt templates for the recommendation and image calls.

pub const STYLIST_SYSTEM_PROMPT: &str = "You are a practical fashion stylist. \
Recommend everyday outfits that keep people comfortable in the weather they describe. \
Answer in plain sentences without lists or markdown.";

/// Text prompt asking what to wear.
pub fn recommendation_prompt(temperature: i32, unit_symbol: &str, summary: &str) -> String {
    let summary = summary.trim();
    let conditions = if summary.is_empty() {
        String::new()
    } else {
        format!(" The forecast says: {}.", summary.trim_end_matches('.'))
    };

    format!(
        "It is {}{} outside.{} What should I wear today? \
         Describe one complete outfit (top, bottom, outerwear if needed, shoes) in at most three sentences.",
        temperature, unit_symbol, conditions
    )
}

/// Image prompt illustrating a recommendation.
pub fn image_prompt(recommendation: &str) -> String {
    format!(
        "A clean flat-lay illustration of the following outfit on a plain light background, \
         no people, no text: {}",
        recommendation.trim()
    )
}
