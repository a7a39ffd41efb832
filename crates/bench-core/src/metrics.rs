//! Cost and throughput calculation.
//!
//! Prices are USD per million tokens. Models missing from the table are
//! billed at [`DEFAULT_PRICING`] (the Sonnet tier) instead of erroring.

/// Per-model token pricing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// USD per million input tokens
    pub input_per_million: f64,
    /// USD per million output tokens
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Create a pricing tier
    #[must_use]
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Cost in USD for the given token counts
    #[must_use]
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input_cost = (f64::from(input_tokens) / 1_000_000.0) * self.input_per_million;
        let output_cost = (f64::from(output_tokens) / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// Tier used for models not present in [`PRICING_TABLE`].
pub const DEFAULT_PRICING: ModelPricing = ModelPricing::new(3.00, 15.00);

/// Known model prices.
pub const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    // Claude 4
    ("claude-sonnet-4-20250514", ModelPricing::new(3.00, 15.00)),
    ("claude-opus-4-20250514", ModelPricing::new(15.00, 75.00)),
    // Claude 3.5
    ("claude-3-5-sonnet-20241022", ModelPricing::new(3.00, 15.00)),
    ("claude-3-5-haiku-20241022", ModelPricing::new(0.80, 4.00)),
    // Claude 3
    ("claude-3-opus-20240229", ModelPricing::new(15.00, 75.00)),
    ("claude-3-haiku-20240307", ModelPricing::new(0.25, 1.25)),
];

/// Look up the pricing tier for a model, falling back to the default tier.
#[must_use]
pub fn pricing_for(model: &str) -> ModelPricing {
    PRICING_TABLE
        .iter()
        .find(|(name, _)| *name == model)
        .map_or(DEFAULT_PRICING, |(_, pricing)| *pricing)
}

/// Whether the model has an explicit entry in the pricing table.
#[must_use]
pub fn is_known_model(model: &str) -> bool {
    PRICING_TABLE.iter().any(|(name, _)| *name == model)
}

/// Cost in USD of a call to `model`.
#[must_use]
pub fn calculate_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    pricing_for(model).cost(input_tokens, output_tokens)
}

/// Output tokens per second over the generation window.
///
/// The window is `total_seconds - ttft_seconds` when a first-token time is
/// known, otherwise `total_seconds`. Returns `0.0` for zero output tokens or
/// a non-positive window.
#[must_use]
pub fn calculate_tokens_per_second(
    output_tokens: u32,
    total_seconds: f64,
    ttft_seconds: Option<f64>,
) -> f64 {
    if output_tokens == 0 {
        return 0.0;
    }

    let generation_seconds = match ttft_seconds {
        Some(ttft) => total_seconds - ttft,
        None => total_seconds,
    };

    if generation_seconds <= 0.0 {
        return 0.0;
    }

    f64::from(output_tokens) / generation_seconds
}
