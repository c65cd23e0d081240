//! Walrus storage sizing and pricing

pub mod encoding;
pub mod pricing;

pub use encoding::{encoded_size, ErasureSizes, SourceSymbols};
pub use pricing::{billing_units, formula_cost, PricingCache, PricingEngine, StoragePricingSource};
