//! Transaction lifecycle capability.
//!
//! The adapter never persists anything itself; it drives an injected
//! [`TransactionSink`] through begin → set_reference → succeed/fail. The
//! bundled [`MemoryTransactions`] sink backs the demo and the tests.

use crate::errors::{GatewayError, Result};
use async_trait::async_trait;

/// Lifecycle state of a local transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Created, payment not yet concluded.
    Pending,
    /// Verified and settled.
    Succeeded,
    /// Aborted by a gateway failure.
    Failed,
}

/// Local transaction record, keyed by the invoice id sent to the provider.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Local invoice id, unique on the merchant side.
    pub id: u64,
    /// Amount in Iranian rials.
    pub amount: u64,
    /// Reference id issued by the token call, if any yet.
    pub ref_id: Option<String>,
    /// Provider reconciliation number (`rrn`), set during verification.
    pub tracking_code: Option<String>,
    /// Masked card number, set during verification.
    pub card_number: Option<String>,
    /// Current lifecycle state.
    pub status: TransactionStatus,
}

impl Transaction {
    fn new(id: u64, amount: u64) -> Self {
        Self {
            id,
            amount,
            ref_id: None,
            tracking_code: None,
            card_number: None,
            status: TransactionStatus::Pending,
        }
    }
}

/// Persistence capability the adapter drives.
///
/// One sink instance tracks one payment flow at a time; `begin` opens a new
/// record and the remaining calls address it. Succeed and fail are terminal,
/// a record transitions at most once.
#[async_trait]
pub trait TransactionSink: Send {
    /// Opens a new transaction record and returns its local invoice id.
    async fn begin(&mut self, amount: u64) -> Result<u64>;

    /// Stores the provider-issued reference id on the active record.
    async fn set_reference(&mut self, ref_id: &str) -> Result<()>;

    /// Stores the reconciliation number and card number on the active record.
    async fn set_receipt(&mut self, tracking_code: &str, card_number: &str) -> Result<()>;

    /// Marks the active record succeeded.
    async fn succeed(&mut self) -> Result<()>;

    /// Marks the active record failed.
    async fn fail(&mut self) -> Result<()>;

    /// Re-attaches the sink to a previously begun record.
    ///
    /// Called by the verify flow, which runs in a fresh request after the
    /// shopper returns from checkout.
    async fn resume(&mut self, id: u64) -> Result<()>;
}

/// In-memory [`TransactionSink`], sufficient for demos and tests.
#[derive(Debug)]
pub struct MemoryTransactions {
    records: Vec<Transaction>,
    active: Option<usize>,
    next_id: u64,
}

impl Default for MemoryTransactions {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransactions {
    /// Creates an empty store with invoice ids starting at 1.
    pub fn new() -> Self {
        Self { records: Vec::new(), active: None, next_id: 1 }
    }

    /// Looks up a record by invoice id.
    pub fn get(&self, id: u64) -> Option<&Transaction> {
        self.records.iter().find(|t| t.id == id)
    }

    fn active_mut(&mut self) -> Result<&mut Transaction> {
        let index = self
            .active
            .ok_or_else(|| GatewayError::Sink("no active transaction".to_string()))?;
        Ok(&mut self.records[index])
    }

    fn terminal(&mut self, status: TransactionStatus) -> Result<()> {
        let record = self.active_mut()?;
        if record.status != TransactionStatus::Pending {
            return Err(GatewayError::Sink(format!(
                "transaction {} is already {:?}",
                record.id, record.status
            )));
        }
        record.status = status;
        Ok(())
    }
}

#[async_trait]
impl TransactionSink for MemoryTransactions {
    async fn begin(&mut self, amount: u64) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(Transaction::new(id, amount));
        self.active = Some(self.records.len() - 1);
        Ok(id)
    }

    async fn set_reference(&mut self, ref_id: &str) -> Result<()> {
        self.active_mut()?.ref_id = Some(ref_id.to_string());
        Ok(())
    }

    async fn set_receipt(&mut self, tracking_code: &str, card_number: &str) -> Result<()> {
        let record = self.active_mut()?;
        record.tracking_code = Some(tracking_code.to_string());
        record.card_number = Some(card_number.to_string());
        Ok(())
    }

    async fn succeed(&mut self) -> Result<()> {
        self.terminal(TransactionStatus::Succeeded)
    }

    async fn fail(&mut self) -> Result<()> {
        self.terminal(TransactionStatus::Failed)
    }

    async fn resume(&mut self, id: u64) -> Result<()> {
        let index = self
            .records
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| GatewayError::Sink(format!("unknown transaction {id}")))?;
        self.active = Some(index);
        Ok(())
    }
}
