//! Example payment initiation against the Asanpardakht IPG.
//!
//! Opens a transaction, requests a token, and prints the redirect page a
//! shop would serve to the shopper. Verification runs in the shop's
//! callback handler once the shopper returns, so it is only sketched here.
//!
//! Run with:
//! ```bash
//! cargo run --example payment
//! ```
//!
//! Environment variables:
//! - MERCHANT_CONFIG_ID: merchant configuration id from the provider
//! - IPG_USERNAME / IPG_PASSWORD: the Usr/Pwd credential pair
//! - CALLBACK_URL: where the shopper lands after checkout
//! - IPG_BASE_URL: optional override, e.g. a local test double

use asanpardakht_rs::{Gateway, GatewayConfig, MemoryTransactions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let merchant_config_id: u64 = std::env::var("MERCHANT_CONFIG_ID")
        .unwrap_or_else(|_| "1044".to_string())
        .parse()?;
    let username = std::env::var("IPG_USERNAME").unwrap_or_else(|_| {
        println!("⚠️  No IPG_USERNAME set, using a placeholder (the call will be rejected)");
        "demo-user".to_string()
    });
    let password = std::env::var("IPG_PASSWORD").unwrap_or_else(|_| "demo-pass".to_string());
    let callback_url = std::env::var("CALLBACK_URL")
        .unwrap_or_else(|_| "https://shop.example/payment/callback".to_string());

    let mut config = GatewayConfig::new(merchant_config_id, username, password, callback_url);
    if let Ok(base_url) = std::env::var("IPG_BASE_URL") {
        config = config.with_base_url(base_url);
    }

    println!("💳 Asanpardakht payment example");
    println!("   merchant: {}", merchant_config_id);
    println!("   gateway:  {}", config.base_url);
    println!();

    let mut sink = MemoryTransactions::new();
    let mut gateway = Gateway::new(config);

    println!("📡 Requesting a payment token for 150,000 rials...");
    match gateway.set(150_000).ready(&mut sink).await {
        Ok(_) => {
            let invoice = gateway.transaction_id().unwrap();
            println!("✅ Token issued, invoice {invoice}, refId {:?}", gateway.ref_id());
            println!("\n📄 Redirect page to serve to the shopper:\n");
            println!("{}", gateway.redirect()?.to_html());
            println!("After the shopper returns to the callback URL, conclude with:");
            println!("    gateway.verify(&transaction, &mut sink).await?;");
        }
        Err(e) => {
            eprintln!("❌ Token request failed: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}
