//! # asanpardakht-rs
//!
//! Rust adapter for the Asanpardakht internet payment gateway (IPG) REST
//! API. One of a family of interchangeable gateway adapters: it initiates,
//! redirects for, and verifies payments against the provider's hosted
//! checkout.
//!
//! ## Payment flow
//!
//! 1. **Token**: `set(amount)` then `ready(sink)` opens a transaction and
//!    obtains a reference id from `v1/Token`.
//! 2. **Redirect**: `redirect()` yields an auto-submitting form that hands
//!    the reference id to the hosted payment page.
//! 3. **Result**: after the shopper returns, `verify(transaction, sink)`
//!    fetches `v1/TranResult` for the invoice.
//! 4. **Verify + settle**: `v1/Verify` then `v1/Settlement`, strictly in
//!    order; only when both pass is the transaction marked succeeded.
//!
//! Every failure marks the transaction failed through the injected
//! [`TransactionSink`], logs one diagnostic event, and surfaces a
//! [`GatewayError`]. There are no retries.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use asanpardakht_rs::{Gateway, GatewayConfig, MemoryTransactions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::new(
//!     1044,
//!     "merchant-user",
//!     "merchant-pass",
//!     "https://shop.example/payment/callback",
//! );
//!
//! let mut sink = MemoryTransactions::new();
//! let mut gateway = Gateway::new(config);
//! gateway.set(150_000).ready(&mut sink).await?;
//!
//! // Serve this page to the shopper:
//! let html = gateway.redirect()?.to_html();
//! # let _ = html;
//! # Ok(())
//! # }
//! ```
//!
//! Authentication uses the provider's custom `Usr`/`Pwd` headers; all
//! request and response bodies follow the provider's camelCase JSON
//! contract, modeled in [`types`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod errors;
pub mod gateway;
pub mod redirect;
pub mod transaction;
pub mod transport;
pub mod types;

// Re-export the types a typical integration touches.
pub use errors::{GatewayError, Result};
pub use gateway::{Gateway, GatewayConfig};
pub use redirect::RedirectPage;
pub use transaction::{MemoryTransactions, Transaction, TransactionSink, TransactionStatus};
pub use transport::HttpReply;
pub use types::TranResult;
