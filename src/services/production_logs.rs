use metrics::counter;
use sea_orm::TransactionTrait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::{self, DbPool},
    entities::{inventory_transaction, TransactionType},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{merge_line_items, Actor, LineItem, NewProductionLog, ProductionLog, MAX_LINE_QUANTITY},
    repositories::{
        DebitOutcome, InventoryRepository, LedgerRepository, NewLedgerEntry,
        ProductionLogRepository, SeaOrmInventoryRepository, SeaOrmLedgerRepository,
        SeaOrmProductionLogRepository,
    },
};

/// Body of `POST /production-log`: raw, possibly repeated lines.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordProductionRequest {
    /// Finished goods produced
    #[serde(default)]
    pub output_item: Vec<LineItem>,
    /// Raw materials consumed
    #[serde(default)]
    pub ingredient_item: Vec<LineItem>,
}

/// A committed production run and the ledger rows it appended.
#[derive(Debug, Clone)]
pub struct ProductionOutcome {
    pub log: ProductionLog,
    pub transactions: Vec<inventory_transaction::Model>,
}

fn check_lines(field: &str, lines: &[LineItem]) -> Result<(), ServiceError> {
    match lines.iter().position(|line| !line.has_valid_quantity()) {
        Some(index) => Err(ServiceError::ValidationError(format!(
            "{}[{}].quantity must be between 1 and {}",
            field, index, MAX_LINE_QUANTITY
        ))),
        None => Ok(()),
    }
}

/// Records one production run against the given stores.
///
/// The event row is written first so every ledger row can point back at it.
/// Ingredients are then debited and outputs credited in merged order; the first
/// failing line aborts the run. Callers provide atomicity by handing in stores
/// bound to a single transaction and discarding it on `Err`.
pub async fn record_production<I, L, P>(
    inventory: &I,
    ledger: &L,
    logs: &P,
    actor: &Actor,
    request: RecordProductionRequest,
) -> Result<ProductionOutcome, ServiceError>
where
    I: InventoryRepository + ?Sized,
    L: LedgerRepository + ?Sized,
    P: ProductionLogRepository + ?Sized,
{
    check_lines("ingredientItem", &request.ingredient_item)?;
    check_lines("outputItem", &request.output_item)?;

    let ingredients = merge_line_items(&request.ingredient_item);
    let outputs = merge_line_items(&request.output_item);
    if ingredients.is_empty() && outputs.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one of outputItem or ingredientItem must contain a line".to_string(),
        ));
    }

    let log = logs
        .insert(NewProductionLog {
            actor: actor.clone(),
            ingredient_items: ingredients.clone(),
            output_items: outputs.clone(),
        })
        .await?;

    let mut transactions = Vec::with_capacity(ingredients.len() + outputs.len());

    for line in &ingredients {
        let record = match inventory.debit(line.product_id, line.quantity).await? {
            DebitOutcome::Applied(record) => record,
            DebitOutcome::Missing => {
                return Err(ServiceError::MissingInventoryRecord {
                    product_id: line.product_id,
                })
            }
            DebitOutcome::Insufficient { available } => {
                return Err(ServiceError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                })
            }
        };

        let row = ledger
            .append(NewLedgerEntry {
                inventory_id: record.id,
                product_id: line.product_id,
                transaction_type: TransactionType::Export,
                quantity: line.quantity,
                price: 0,
                note: Some(format!("{} - production export", actor.name)),
                production_log_id: Some(log.id),
            })
            .await?;
        transactions.push(row);
    }

    for line in &outputs {
        let credited = inventory.credit(line.product_id, line.quantity).await?;
        let row = ledger
            .append(NewLedgerEntry {
                inventory_id: credited.record().id,
                product_id: line.product_id,
                transaction_type: TransactionType::Import,
                quantity: line.quantity,
                price: 0,
                note: Some(format!("{} - production import", actor.name)),
                production_log_id: Some(log.id),
            })
            .await?;
        transactions.push(row);
    }

    Ok(ProductionOutcome { log, transactions })
}

/// Service for recording and reading production runs
#[derive(Clone)]
pub struct ProductionLogService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductionLogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a production run in one database transaction.
    #[instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn record(
        &self,
        actor: &Actor,
        request: RecordProductionRequest,
    ) -> Result<ProductionLog, ServiceError> {
        let started = Instant::now();
        let txn = self.db_pool.begin().await?;

        let result = record_production(
            &SeaOrmInventoryRepository::new(&txn),
            &SeaOrmLedgerRepository::new(&txn),
            &SeaOrmProductionLogRepository::new(&txn),
            actor,
            request,
        )
        .await;

        let outcome = match result {
            Ok(outcome) => {
                db::commit_tracked(txn, "record_production", started).await?;
                outcome
            }
            Err(e) => {
                drop(txn);
                db::record_rollback("record_production", started);
                counter!("foodstock_production.rejected", 1);
                if e.is_business_rejection() {
                    warn!(error = %e, "production run rejected");
                } else {
                    error!(error = %e, "production run failed");
                }
                return Err(e);
            }
        };

        counter!("foodstock_production.recorded", 1);
        info!(
            production_log_id = %outcome.log.id,
            ledger_rows = outcome.transactions.len(),
            "production run recorded"
        );

        let mut events = vec![Event::ProductionRecorded {
            production_log_id: outcome.log.id,
            actor_id: outcome.log.actor_id.clone(),
            ingredient_lines: outcome.log.ingredient_item.len(),
            output_lines: outcome.log.output_item.len(),
        }];
        events.extend(outcome.transactions.iter().map(|tx| Event::StockMovementRecorded {
            transaction_id: tx.id,
            product_id: tx.product_id,
            transaction_type: tx.r#type,
            quantity: tx.quantity,
            production_log_id: tx.production_log_id,
        }));
        self.event_sender.send_or_log(events);

        Ok(outcome.log)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductionLog, ServiceError> {
        SeaOrmProductionLogRepository::new(self.db_pool.as_ref())
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Production log {} not found", id)))
    }

    /// Newest first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductionLog>, u64), ServiceError> {
        Ok(SeaOrmProductionLogRepository::new(self.db_pool.as_ref())
            .find_page(page, per_page)
            .await?)
    }
}
