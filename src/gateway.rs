//! The gateway adapter: payment initiation, redirect, and verification.
//!
//! One [`Gateway`] instance drives one payment flow at a time against the
//! IPG REST service: token acquisition, hosted-page redirect, transaction
//! result retrieval, then verify and settle. Every remote call is awaited
//! before the next and a failure at any step aborts the rest of the flow.

use crate::errors::{status_message, GatewayError, Result};
use crate::redirect::RedirectPage;
use crate::transaction::{Transaction, TransactionSink};
use crate::transport::RestTransport;
use crate::types::{
    endpoints, local_date_stamp, strip_quotes, SettlementRequest, TokenRequest, TranResult,
    TranResultQuery, DEFAULT_BASE_URL, PAYMENT_ID_NONE, SERVICE_TYPE_WEB,
};
use url::Url;

/// Merchant-side configuration for the gateway, injected at construction.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Merchant configuration id assigned by the provider.
    pub merchant_config_id: u64,

    /// Username sent in the `Usr` header.
    pub username: String,

    /// Password sent in the `Pwd` header.
    pub password: String,

    /// URL the shopper is sent back to after checkout. The local invoice id
    /// is appended as an `invoice` query parameter.
    pub callback_url: String,

    /// Base URL of the REST service.
    pub base_url: String,
}

impl GatewayConfig {
    /// Creates a configuration against the production service.
    ///
    /// # Examples
    ///
    /// ```
    /// use asanpardakht_rs::gateway::GatewayConfig;
    ///
    /// let config = GatewayConfig::new(
    ///     1044,
    ///     "merchant-user",
    ///     "merchant-pass",
    ///     "https://shop.example/payment/callback",
    /// );
    /// ```
    pub fn new(
        merchant_config_id: u64,
        username: impl Into<String>,
        password: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            merchant_config_id,
            username: username.into(),
            password: password.into(),
            callback_url: callback_url.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the adapter at a different base URL, e.g. a sandbox or a
    /// test double.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Adapter for one payment flow against the IPG REST service.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    transport: RestTransport,
    amount: u64,
    transaction_id: Option<u64>,
    ref_id: Option<String>,
    tracking_code: Option<String>,
    card_number: Option<String>,
}

impl Gateway {
    /// Creates an adapter from an injected configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let transport = RestTransport::new(
            config.base_url.clone(),
            config.username.clone(),
            config.password.clone(),
        );
        Self {
            config,
            transport,
            amount: 0,
            transaction_id: None,
            ref_id: None,
            tracking_code: None,
            card_number: None,
        }
    }

    /// Stores the amount, in rials, for the next payment. Chains.
    pub fn set(&mut self, amount: u64) -> &mut Self {
        self.amount = amount;
        self
    }

    /// The stored amount in rials.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Local invoice id of the active flow, once `ready` or `verify` ran.
    pub fn transaction_id(&self) -> Option<u64> {
        self.transaction_id
    }

    /// Reference id issued by the provider, once the token call succeeded.
    pub fn ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref()
    }

    /// Reconciliation number (`rrn`), once verification ran.
    pub fn tracking_code(&self) -> Option<&str> {
        self.tracking_code.as_deref()
    }

    /// Masked card number, once verification ran.
    pub fn card_number(&self) -> Option<&str> {
        self.card_number.as_deref()
    }

    /// Opens a new transaction and requests a payment token.
    ///
    /// On success the provider's reference id is stored on the adapter and
    /// pushed to the sink; the flow is then ready for [`Gateway::redirect`].
    /// On any failure the transaction is marked failed, one diagnostic
    /// event is logged, and the error is returned.
    pub async fn ready(&mut self, sink: &mut dyn TransactionSink) -> Result<&mut Self> {
        let id = sink.begin(self.amount).await?;
        self.transaction_id = Some(id);

        match self.token().await {
            Ok(ref_id) => {
                sink.set_reference(&ref_id).await?;
                self.ref_id = Some(ref_id);
                Ok(self)
            }
            Err(err) => {
                self.abort(sink, &err).await;
                Err(err)
            }
        }
    }

    /// Produces the redirect artifact for the hosted payment page.
    ///
    /// Requires the reference id from a successful [`Gateway::ready`].
    pub fn redirect(&self) -> Result<RedirectPage> {
        let ref_id = self
            .ref_id
            .as_deref()
            .ok_or(GatewayError::MissingReference("redirect requires a ready() flow"))?;
        Ok(RedirectPage::new(ref_id))
    }

    /// Concludes a payment after the shopper returns from checkout.
    ///
    /// Fetches the transaction result, records the reference id, tracking
    /// code, and card number, then verifies and settles with the provider's
    /// `payGateTranID`. Only when both verify and settlement pass is the
    /// transaction marked succeeded.
    pub async fn verify(
        &mut self,
        transaction: &Transaction,
        sink: &mut dyn TransactionSink,
    ) -> Result<&mut Self> {
        self.transaction_id = Some(transaction.id);
        self.amount = transaction.amount;
        sink.resume(transaction.id).await?;

        match self.verify_flow(sink).await {
            Ok(()) => Ok(self),
            Err(err) => {
                self.abort(sink, &err).await;
                Err(err)
            }
        }
    }

    async fn verify_flow(&mut self, sink: &mut dyn TransactionSink) -> Result<()> {
        let result = self.tran_result().await?;
        sink.set_receipt(&result.rrn, &result.card_number).await?;
        self.ref_id = Some(result.ref_id);
        self.tracking_code = Some(result.rrn);
        self.card_number = Some(result.card_number);

        self.verify_and_settle(&result.pay_gate_tran_id).await?;
        sink.succeed().await?;
        Ok(())
    }

    /// Requests a payment token for the active transaction.
    ///
    /// Returns the reference id with the provider's surrounding quote
    /// characters stripped.
    pub async fn token(&self) -> Result<String> {
        let id = self
            .transaction_id
            .ok_or(GatewayError::MissingReference("token requires a begun transaction"))?;
        let request = TokenRequest {
            service_type_id: SERVICE_TYPE_WEB,
            merchant_configuration_id: self.config.merchant_config_id,
            local_invoice_id: id,
            amount_in_rials: self.amount,
            local_date: local_date_stamp(),
            callback_url: self.callback_with_invoice(id)?,
            payment_id: PAYMENT_ID_NONE,
            additional_data: String::new(),
        };

        let reply = self.transport.post(endpoints::TOKEN, &request).await?;
        if !reply.is_ok() {
            return Err(GatewayError::provider(reply.status));
        }
        Ok(strip_quotes(&reply.body))
    }

    /// Fetches the provider's result record for the active transaction.
    pub async fn tran_result(&self) -> Result<TranResult> {
        let id = self
            .transaction_id
            .ok_or(GatewayError::MissingReference("tran_result requires a transaction id"))?;
        let query = TranResultQuery {
            merchant_configuration_id: self.config.merchant_config_id,
            local_invoice_id: id,
        };

        let reply = self.transport.get(endpoints::TRAN_RESULT, Some(&query)).await?;
        if !reply.is_ok() {
            return Err(GatewayError::provider(reply.status));
        }
        Ok(serde_json::from_str(&reply.body)?)
    }

    /// Verifies, then settles, the given provider transaction id.
    ///
    /// The two calls run strictly in order; settlement is never attempted
    /// when verification fails.
    pub async fn verify_and_settle(&self, pay_gate_tran_id: &str) -> Result<()> {
        self.post_transition(endpoints::VERIFY, pay_gate_tran_id).await?;
        self.post_transition(endpoints::SETTLEMENT, pay_gate_tran_id).await?;
        Ok(())
    }

    /// Releases an unsettled transaction back to the shopper's account.
    pub async fn cancel(&self, pay_gate_tran_id: &str) -> Result<()> {
        self.post_transition(endpoints::CANCEL, pay_gate_tran_id).await
    }

    /// Reverses an already settled transaction.
    pub async fn reverse(&self, pay_gate_tran_id: &str) -> Result<()> {
        self.post_transition(endpoints::REVERSE, pay_gate_tran_id).await
    }

    /// Looks up the stored card-hash record for the active transaction.
    pub async fn card_hash(&self) -> Result<String> {
        let id = self
            .transaction_id
            .ok_or(GatewayError::MissingReference("card_hash requires a transaction id"))?;
        let query = TranResultQuery {
            merchant_configuration_id: self.config.merchant_config_id,
            local_invoice_id: id,
        };

        let reply = self.transport.get(endpoints::CARD_HASH, Some(&query)).await?;
        if !reply.is_ok() {
            return Err(GatewayError::provider(reply.status));
        }
        Ok(reply.body.trim().to_string())
    }

    /// Health probe: the provider's server clock.
    ///
    /// No flow step calls this; it exists for connectivity diagnostics.
    pub async fn time(&self) -> Result<String> {
        let reply = self.transport.get::<()>(endpoints::TIME, None).await?;
        if !reply.is_ok() {
            return Err(GatewayError::provider(reply.status));
        }
        Ok(strip_quotes(&reply.body))
    }

    async fn post_transition(&self, path: &str, pay_gate_tran_id: &str) -> Result<()> {
        let request = SettlementRequest {
            merchant_configuration_id: self.config.merchant_config_id,
            pay_gate_tran_id: pay_gate_tran_id.to_string(),
        };

        let reply = self.transport.post(path, &request).await?;
        if !reply.is_ok() {
            return Err(GatewayError::provider(reply.status));
        }
        Ok(())
    }

    /// Marks the transaction failed and writes the one diagnostic event
    /// for this failure.
    async fn abort(&self, sink: &mut dyn TransactionSink, err: &GatewayError) {
        match err.provider_code() {
            Some(code) => {
                tracing::warn!(code, reason = status_message(code), "payment flow aborted");
            }
            None => {
                tracing::error!(error = %err, "payment flow aborted");
            }
        }
        if let Err(sink_err) = sink.fail().await {
            tracing::error!(error = %sink_err, "could not mark transaction failed");
        }
    }

    fn callback_with_invoice(&self, id: u64) -> Result<String> {
        let mut url = Url::parse(&self.config.callback_url)?;
        url.query_pairs_mut().append_pair("invoice", &id.to_string());
        Ok(url.into())
    }
}
