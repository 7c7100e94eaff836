//! Usage accounting for one dispatch: token totals, cost and a redacted
//! history preview for logs.

pub mod pricing;
pub mod record;

pub use pricing::{CatalogPricing, PriceLookup};
pub use record::{history_preview, CompletedExchange, UsageRecord, UsageReporter, CHAT_MODULE_TYPE};
