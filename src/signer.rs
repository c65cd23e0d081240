//! Wallet signer abstraction
//!
//! The SDK never holds keys. A built [`DonationTransaction`] is handed to a
//! signer (browser wallet bridge, custody API, local keystore) which signs,
//! submits and reports the transaction digest.

use crate::error::Result;
use crate::ptb::DonationTransaction;
use crate::types::SuiAddress;

/// Signs and executes donation transactions
pub trait TransactionSigner: Send + Sync {
    /// Address the signer signs for; must match the donation's sender
    fn address(&self) -> SuiAddress;

    /// Sign and execute `tx`, returning the transaction digest
    fn sign_and_execute(
        &self,
        tx: &DonationTransaction,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
