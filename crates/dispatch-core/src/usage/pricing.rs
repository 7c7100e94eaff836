use crate::model::ModelCapabilities;

/// Cost of `tokens` tokens on a model.
pub trait PriceLookup: Send + Sync {
    fn price(&self, model: &ModelCapabilities, tokens: u32) -> f64;
}

/// Prices straight from the catalog's per-token price.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogPricing;

impl PriceLookup for CatalogPricing {
    fn price(&self, model: &ModelCapabilities, tokens: u32) -> f64 {
        model.price * f64::from(tokens)
    }
}
