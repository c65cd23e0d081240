//! Core data types

pub mod coin;
pub mod donation;
pub mod move_type;
pub mod object;
pub mod storage;
pub mod token;

pub use coin::{CoinPage, CoinRecord};
pub use donation::{DonationBuildResult, DonationFlow, DonationRequest, PriceQuote};
pub use move_type::{StructTag, TypeTag};
pub use object::{ObjectDigest, ObjectId, ObjectRef, SharedObjectRef, SuiAddress};
pub use storage::{CostSource, LiveCost, PricingSnapshot, StorageCostEstimate};
pub use token::{FeedId, TokenDescriptor};
