//! Usage pricing: token counts to credits.
//!
//! Prices are credits (COP) per million tokens. A model name matches its exact entry
//! first, then the longest entry that prefixes it, so dated snapshots such as
//! `gpt-4o-mini-2024-07-18` are priced like their family.

use std::collections::HashMap;

/// Minimum charge for any billed interaction.
pub const MIN_COST: i64 = 1;

/// Price of one model, in credits per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPrice {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// Built-in price list.
const DEFAULT_PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-4o-mini", ModelPrice::new(600.0, 2_400.0)),
    ("gpt-4o", ModelPrice::new(10_000.0, 40_000.0)),
    ("gpt-4.1-nano", ModelPrice::new(400.0, 1_600.0)),
    ("gpt-4.1-mini", ModelPrice::new(1_600.0, 6_400.0)),
    ("gpt-4.1", ModelPrice::new(8_000.0, 32_000.0)),
    ("gpt-3.5-turbo", ModelPrice::new(2_000.0, 6_000.0)),
];

/// Fallback for models missing from the table.
const FALLBACK_PRICE: ModelPrice = ModelPrice::new(600.0, 2_400.0);

/// Per-model price table with a fallback entry.
#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: HashMap<String, ModelPrice>,
    fallback: ModelPrice,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            prices: DEFAULT_PRICES
                .iter()
                .map(|(model, price)| (model.to_string(), *price))
                .collect(),
            fallback: FALLBACK_PRICE,
        }
    }
}

impl PriceTable {
    /// An empty table that prices everything at `fallback`.
    pub fn with_fallback(fallback: ModelPrice) -> Self {
        Self {
            prices: HashMap::new(),
            fallback,
        }
    }

    /// Add or replace a model's price.
    pub fn insert(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        self.prices.insert(model.into().to_ascii_lowercase(), price);
        self
    }

    /// Price entry used for `model`.
    pub fn price_for(&self, model: &str) -> ModelPrice {
        let model = model.trim().to_ascii_lowercase();

        if let Some(price) = self.prices.get(&model) {
            return *price;
        }

        self.prices
            .iter()
            .filter(|(name, _)| model.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, price)| *price)
            .unwrap_or(self.fallback)
    }

    /// Credits charged for a completion. Never less than [`MIN_COST`].
    pub fn cost(&self, model: &str, prompt_tokens: i64, completion_tokens: i64) -> i64 {
        let price = self.price_for(model);
        let prompt = prompt_tokens.max(0) as f64;
        let completion = completion_tokens.max(0) as f64;

        let raw = prompt / 1_000_000.0 * price.input_per_million
            + completion / 1_000_000.0 * price.output_per_million;

        (raw.round() as i64).max(MIN_COST)
    }
}

/// Credits charged for a completion using the built-in price list.
pub fn cost(model: &str, prompt_tokens: i64, completion_tokens: i64) -> i64 {
    PriceTable::default().cost(model, prompt_tokens, completion_tokens)
}
