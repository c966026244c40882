//! Wire types for the Asanpardakht IPG REST contract.
//!
//! Field names follow the provider's JSON exactly via serde renames; the
//! structs here are the only place the provider's spelling appears.

use chrono::{FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Production base URL of the IPG REST service.
pub const DEFAULT_BASE_URL: &str = "https://ipgrest.asanpardakht.ir";

/// Hosted payment page the shopper is redirected to with a reference id.
pub const HOSTED_PAGE_URL: &str = "https://asan.shaparak.ir";

/// Service type sent with every token request. `1` is a plain web purchase.
pub const SERVICE_TYPE_WEB: u32 = 1;

/// Payment id sent with every token request; the flow never splits payments.
pub const PAYMENT_ID_NONE: u32 = 0;

/// Relative endpoint paths under the REST base URL.
pub mod endpoints {
    /// Token issuance (POST).
    pub const TOKEN: &str = "v1/Token";
    /// Server clock probe (GET).
    pub const TIME: &str = "v1/Time";
    /// Transaction result lookup (GET).
    pub const TRAN_RESULT: &str = "v1/TranResult";
    /// Stored card-hash lookup (GET).
    pub const CARD_HASH: &str = "v1/CardHash";
    /// Settlement of a verified transaction (POST).
    pub const SETTLEMENT: &str = "v1/Settlement";
    /// Verification of a completed transaction (POST).
    pub const VERIFY: &str = "v1/Verify";
    /// Release of an unsettled transaction (POST).
    pub const CANCEL: &str = "v1/Cancel";
    /// Reversal of a settled transaction (POST).
    pub const REVERSE: &str = "v1/Reverse";
}

/// Body of the token request that opens a payment session.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenRequest {
    /// Kind of service being paid for; always [`SERVICE_TYPE_WEB`] here.
    #[serde(rename = "serviceTypeId")]
    pub service_type_id: u32,

    /// Merchant configuration id assigned by the provider.
    #[serde(rename = "merchantConfigurationId")]
    pub merchant_configuration_id: u64,

    /// Local invoice id, unique per transaction on the merchant side.
    #[serde(rename = "localInvoiceId")]
    pub local_invoice_id: u64,

    /// Amount in Iranian rials.
    #[serde(rename = "amountInRials")]
    pub amount_in_rials: u64,

    /// Merchant-local timestamp, `YYYYMMDD HHMMSS` in Tehran time.
    #[serde(rename = "localDate")]
    pub local_date: String,

    /// URL the shopper is sent back to after checkout.
    #[serde(rename = "callbackURL")]
    pub callback_url: String,

    /// Sub-payment id; always [`PAYMENT_ID_NONE`] here.
    #[serde(rename = "paymentId")]
    pub payment_id: u32,

    /// Free-form passthrough data; sent empty.
    #[serde(rename = "additionalData")]
    pub additional_data: String,
}

/// Result record returned for a completed checkout.
///
/// Only the fields the flow consumes are modeled; unknown keys in the
/// provider's body are ignored.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TranResult {
    /// Reference id of the payment session, echoing the token call.
    #[serde(rename = "refID")]
    pub ref_id: String,

    /// Retrieval reference number used for reconciliation.
    pub rrn: String,

    /// Masked card number the shopper paid with.
    #[serde(rename = "cardNumber")]
    pub card_number: String,

    /// Provider-internal transaction id, required for verify and settle.
    #[serde(rename = "payGateTranID", deserialize_with = "string_or_number")]
    pub pay_gate_tran_id: String,
}

/// Body shared by the Verify, Settlement, Cancel, and Reverse calls.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SettlementRequest {
    /// Merchant configuration id assigned by the provider.
    #[serde(rename = "merchantConfigurationId")]
    pub merchant_configuration_id: u64,

    /// Provider-internal transaction id from the result lookup.
    #[serde(rename = "payGateTranId")]
    pub pay_gate_tran_id: String,
}

/// Query parameters of the transaction-result and card-hash lookups.
#[derive(Serialize, Debug, Clone)]
pub struct TranResultQuery {
    /// Merchant configuration id assigned by the provider.
    #[serde(rename = "merchantConfigurationId")]
    pub merchant_configuration_id: u64,

    /// Local invoice id the lookup is keyed by.
    #[serde(rename = "localInvoiceId")]
    pub local_invoice_id: u64,
}

/// Accepts a JSON string or number and yields its string form.
///
/// The provider sends `payGateTranID` as a number in some responses and a
/// string in others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

/// Tehran is UTC+03:30 year-round; Iran abolished DST in 2022.
const TEHRAN_OFFSET_SECS: i32 = 3 * 3600 + 30 * 60;

/// Current Tehran-local timestamp in the provider's `YYYYMMDD HHMMSS` shape.
pub fn local_date_stamp() -> String {
    let offset = FixedOffset::east_opt(TEHRAN_OFFSET_SECS).unwrap();
    Utc::now().with_timezone(&offset).format("%Y%m%d %H%M%S").to_string()
}

/// Strips the quote characters the provider wraps bare-string bodies in.
pub fn strip_quotes(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}
