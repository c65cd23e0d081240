//! Interactive CLI for the crowdfund SDK
//!
//! Run with: cargo run --example interactive
//!
//! Requires the CROWDFUND_* and WALRUS_* variables read by `NetworkConfig::from_env`,
//! plus DONOR_ADDRESS, SUI_FEED_ID and SUI_PRICE_INFO_ID for donation drafts.

use std::io::{self, Write};

use crowdfund_sdk::constants::{mist_to_sui, SUI_COIN_TYPE, SUI_DECIMALS};
use crowdfund_sdk::types::FeedId;
use crowdfund_sdk::{
    format_raw_amount, parse_to_raw_amount, DonationFlow, DonationRequest, Network,
    NetworkConfig, ObjectId, RpcCrowdfundClient, TokenDescriptor,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let network: Network = std::env::var("CROWDFUND_NETWORK")
        .unwrap_or_else(|_| "testnet".to_string())
        .parse()?;
    let config = NetworkConfig::from_env(network)?;
    let client = RpcCrowdfundClient::connect(config)?;

    println!("\n========================================");
    println!("     Crowdfund SDK Interactive CLI");
    println!("========================================");
    println!("Network: {}", client.config().network);

    loop {
        println!("\n----------------------------------------");
        println!("Select an option:");
        println!("  1. Quote storage cost");
        println!("  2. View SUI balance");
        println!("  3. Prepare SUI donation");
        println!("  q. Quit");
        println!("----------------------------------------");

        let choice = prompt("Enter choice: ")?;
        let result = match choice.as_str() {
            "1" => storage_quote_flow(&client).await,
            "2" => balance_flow(&client).await,
            "3" => donation_flow(&client).await,
            "q" | "Q" => {
                println!("\nGoodbye!");
                break;
            }
            _ => {
                println!("\nInvalid choice. Please try again.");
                Ok(())
            }
        };

        if let Err(err) = result {
            println!("\nError: {}", err);
        }
    }

    Ok(())
}

/// Quote the cost of storing a file of a given size
async fn storage_quote_flow(client: &RpcCrowdfundClient) -> eyre::Result<()> {
    println!("\n=== STORAGE QUOTE ===");
    let size: u64 = prompt("File size in bytes: ")?.parse()?;
    let epochs: u32 = prompt("Epochs: ")?.parse()?;

    match client.estimate_storage_cost(size, epochs).await {
        Ok(estimate) => {
            println!("Encoded size:  {} bytes ({} units)", estimate.encoded_size, estimate.billing_units);
            println!("Storage cost:  {:.6} WAL", estimate.storage_cost_wal);
            println!("Write cost:    {:.6} WAL", estimate.write_cost_wal);
            println!("Total:         {:.6} WAL", estimate.total_cost_wal);
            println!(
                "With subsidy:  {:.6} WAL ({:.0}% off, {:?} pricing)",
                estimate.subsidized_total_cost_wal,
                estimate.subsidy_rate * 100.0,
                estimate.source
            );
        }
        Err(err) => println!("{}", err.user_message()),
    }
    Ok(())
}

async fn balance_flow(client: &RpcCrowdfundClient) -> eyre::Result<()> {
    let donor = donor_address()?;
    let balance = client.balance(&donor, SUI_COIN_TYPE).await?;
    println!("\nSUI Balance: {:.6} SUI", mist_to_sui(balance));
    Ok(())
}

/// Build an unsigned first-time SUI donation and print it
async fn donation_flow(client: &RpcCrowdfundClient) -> eyre::Result<()> {
    println!("\n=== PREPARE DONATION ===");
    let donor = donor_address()?;
    let campaign: ObjectId = prompt("Campaign id: ")?.parse()?;
    let stats: ObjectId = prompt("Campaign stats id: ")?.parse()?;
    let amount = prompt("Amount (SUI): ")?;

    let token = TokenDescriptor {
        coin_type: SUI_COIN_TYPE.to_string(),
        symbol: "SUI".to_string(),
        decimals: SUI_DECIMALS,
        enabled: true,
        feed_id: env_var("SUI_FEED_ID")?.parse::<FeedId>()?,
        max_price_age_secs: 60,
        price_info_object: env_var("SUI_PRICE_INFO_ID")?.parse()?,
    };

    let raw_amount = match parse_to_raw_amount(&amount, token.decimals) {
        Ok(raw) => raw,
        Err(err) => {
            println!("{}", err.user_message());
            return Ok(());
        }
    };

    let request = DonationRequest::new(donor, campaign, stats, token, raw_amount);
    match client.build_donation(&request, DonationFlow::FirstTime).await {
        Ok(built) => {
            println!(
                "Donating {} SUI worth ${}",
                format_raw_amount(built.raw_amount, SUI_DECIMALS),
                format_raw_amount(built.quoted_usd_micro, 6)
            );
            println!("Minimum accepted: ${}", format_raw_amount(built.expected_min_usd_micro, 6));
            println!("Gas budget: {:?}", built.transaction.gas_budget);
            println!("Transaction kind: {}", built.transaction.kind_base64()?);
        }
        Err(err) => println!("{}", err.user_message()),
    }
    Ok(())
}

fn donor_address() -> eyre::Result<ObjectId> {
    Ok(env_var("DONOR_ADDRESS")?.parse()?)
}

fn env_var(key: &str) -> eyre::Result<String> {
    std::env::var(key).map_err(|_| eyre::eyre!("{} must be set", key))
}

fn prompt(label: &str) -> eyre::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
