//! Error types for the crowdfund SDK
//!
//! Transport code uses `eyre` for context; everything handed back to callers is
//! the typed [`Error`] so the UI can match on the failure kind.

pub use eyre::{eyre, Context, Report};

/// Every failure the SDK can surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// User-entered amount could not be turned into a raw integer amount
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Wallet does not hold enough of the donation token
    #[error("insufficient {symbol}: required {required}, available {available}")]
    InsufficientBalance {
        symbol: String,
        required: u64,
        available: u64,
    },

    /// Balance is spread over more coins than a transaction can pay gas with
    #[error("{count} gas coins selected, at most {max} allowed")]
    TooManyGasCoins { count: usize, max: usize },

    /// Native balance covers the donation but not the gas reserve
    #[error("insufficient gas reserve: required {required} for gas, available {available}")]
    InsufficientGasReserve { required: u64, available: u64 },

    #[error("price feed returned a zero or negative quote")]
    ZeroPriceQuote,

    /// Slippage-adjusted minimum rounded down to zero
    #[error("slippage of {slippage_bps} bps leaves no acceptable minimum for quote {quoted}")]
    SlippageTooStrict { quoted: u64, slippage_bps: u16 },

    #[error("price update published at {publish_time} is older than {max_age_secs}s")]
    StalePriceQuote { publish_time: i64, max_age_secs: u64 },

    /// Live pricing query failed and there is nothing to fall back to
    #[error("storage pricing unavailable: {0}")]
    PricingUnavailable(#[source] Box<Error>),

    #[error("encoded size overflowed for {raw_size} bytes over {shard_count} shards")]
    EncodingOverflow { raw_size: u64, shard_count: u16 },

    #[error("amount overflow: {0}")]
    AmountOverflow(String),

    /// A ledger or oracle response did not have the expected shape
    #[error("malformed ledger response: {0}")]
    MalformedLedgerResponse(String),

    /// JSON-RPC error object returned by the node
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("token {0} is not enabled for donations")]
    TokenDisabled(String),

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] Report),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedLedgerResponse(reason.into())
    }

    /// Short message suitable for rendering directly to the donor
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidAmount(_) => "Please enter a valid amount".to_string(),
            Error::InsufficientBalance { symbol, .. } => {
                format!("Insufficient {} balance for this donation", symbol)
            }
            Error::InsufficientGasReserve { .. } => {
                "Insufficient SUI to cover the donation plus gas fees".to_string()
            }
            Error::TooManyGasCoins { .. } => {
                "Too many small SUI coins, merge them before donating".to_string()
            }
            Error::ZeroPriceQuote => "Price feed is unavailable for this token".to_string(),
            Error::SlippageTooStrict { .. } => {
                "Slippage tolerance is too strict for this amount".to_string()
            }
            Error::StalePriceQuote { .. } => {
                "Token price is out of date, please try again".to_string()
            }
            Error::PricingUnavailable(_) => {
                "Storage pricing is unavailable right now".to_string()
            }
            Error::EncodingOverflow { .. } => "File is too large to store".to_string(),
            Error::AmountOverflow(_) => "Amount is too large".to_string(),
            Error::MalformedLedgerResponse(_) | Error::Rpc { .. } => {
                "The network returned an unexpected response".to_string()
            }
            Error::TokenDisabled(symbol) => {
                format!("{} is not accepted for donations", symbol)
            }
            Error::Validation { field, .. } => format!("Invalid {}", field.replace('_', " ")),
            Error::Config(_) => "The app is misconfigured".to_string(),
            Error::Other(_) => "Network request failed, please try again".to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_reserve_message() {
        let err = Error::InsufficientGasReserve {
            required: 30_000_000,
            available: 29_999_999,
        };
        assert_eq!(
            err.user_message(),
            "Insufficient SUI to cover the donation plus gas fees"
        );
    }

    #[test]
    fn test_network_cause_preserved() {
        let err: Error = Err::<(), _>(std::io::Error::other("connection reset"))
            .context("Failed to fetch coins")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Other(_)));
        assert!(format!("{:?}", err).contains("connection reset"));
    }
}
