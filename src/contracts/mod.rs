//! Move call bindings for the crowdfunding and oracle packages

pub mod donation;
pub mod oracle;

pub use donation::{DonationCall, DonationObjects};
