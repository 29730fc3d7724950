//! Storage ports driven by the stock workflows.
//!
//! The traits are what the workflows in [`crate::services`] depend on; the
//! sea-orm implementations run against any [`sea_orm::ConnectionTrait`], which
//! in practice is the request's open transaction.

use async_trait::async_trait;
use sea_orm::DbErr;
use uuid::Uuid;

use crate::entities::{inventory, inventory_transaction, TransactionType};
use crate::models::{NewProductionLog, ProductionLog};

pub mod inventory_repository;
pub mod ledger_repository;
pub mod production_log_repository;

#[cfg(test)]
pub(crate) mod memory;

pub use inventory_repository::SeaOrmInventoryRepository;
pub use ledger_repository::SeaOrmLedgerRepository;
pub use production_log_repository::SeaOrmProductionLogRepository;

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Stock was decremented; carries the updated record.
    Applied(inventory::Model),
    /// The record holds less than requested and was left untouched.
    Insufficient { available: i64 },
    /// No record exists for the product.
    Missing,
}

/// Result of a stock increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    Updated(inventory::Model),
    Created(inventory::Model),
}

impl CreditOutcome {
    pub fn record(&self) -> &inventory::Model {
        match self {
            CreditOutcome::Updated(record) | CreditOutcome::Created(record) => record,
        }
    }
}

/// Per-product on-hand quantities.
///
/// Debits and credits are single storage-side operations so that concurrent
/// callers can never lose an update or drive stock below zero.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn find(&self, product_id: Uuid) -> Result<Option<inventory::Model>, DbErr>;

    /// Decrements stock by `quantity` only if at least that much is on hand.
    async fn debit(&self, product_id: Uuid, quantity: i64) -> Result<DebitOutcome, DbErr>;

    /// Increments stock by `quantity`, creating the record when absent.
    async fn credit(&self, product_id: Uuid, quantity: i64) -> Result<CreditOutcome, DbErr>;
}

/// A ledger row to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub inventory_id: Uuid,
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub price: i64,
    pub note: Option<String>,
    pub production_log_id: Option<Uuid>,
}

/// Append-only stock movement ledger.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn append(&self, entry: NewLedgerEntry) -> Result<inventory_transaction::Model, DbErr>;
}

/// Writer of production run records.
#[async_trait]
pub trait ProductionLogRepository: Send + Sync {
    async fn insert(&self, log: NewProductionLog) -> Result<ProductionLog, DbErr>;
}
