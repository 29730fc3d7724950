use metrics::counter;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::{self, DbPool},
    entities::{
        inventory::{self, Entity as Inventory},
        inventory_transaction::{self, Entity as InventoryTransaction},
        TransactionType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Actor, MAX_LINE_QUANTITY},
    repositories::{
        DebitOutcome, InventoryRepository, LedgerRepository, NewLedgerEntry,
        SeaOrmInventoryRepository, SeaOrmLedgerRepository,
    },
};

const MAX_NOTE_LENGTH: usize = 500;

/// Manual stock movement for a single product
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementRequest {
    pub product_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub quantity: i64,
    /// Unit value in minor currency units
    #[serde(default)]
    pub price: i64,
    pub note: Option<String>,
}

/// Filters for ledger queries; all optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub product_id: Option<Uuid>,
    pub production_log_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
}

fn movement_action(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Import => "stock import",
        TransactionType::Export => "stock export",
        TransactionType::ReturnDamaged => "damaged return",
    }
}

/// Applies one manual movement: credits for `IMPORT`, guarded debits otherwise.
pub async fn record_stock_movement<I, L>(
    inventory: &I,
    ledger: &L,
    actor: &Actor,
    request: StockMovementRequest,
) -> Result<inventory_transaction::Model, ServiceError>
where
    I: InventoryRepository + ?Sized,
    L: LedgerRepository + ?Sized,
{
    if !(1..=MAX_LINE_QUANTITY).contains(&request.quantity) {
        return Err(ServiceError::ValidationError(format!(
            "quantity must be between 1 and {}",
            MAX_LINE_QUANTITY
        )));
    }
    if request.price < 0 {
        return Err(ServiceError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }
    let note = request.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    if note.map_or(false, |n| n.chars().count() > MAX_NOTE_LENGTH) {
        return Err(ServiceError::ValidationError(format!(
            "note must be at most {} characters",
            MAX_NOTE_LENGTH
        )));
    }

    let inventory_id = if request.transaction_type.is_credit() {
        inventory
            .credit(request.product_id, request.quantity)
            .await?
            .record()
            .id
    } else {
        match inventory.debit(request.product_id, request.quantity).await? {
            DebitOutcome::Applied(record) => record.id,
            DebitOutcome::Missing => {
                return Err(ServiceError::MissingInventoryRecord {
                    product_id: request.product_id,
                })
            }
            DebitOutcome::Insufficient { available } => {
                return Err(ServiceError::InsufficientStock {
                    product_id: request.product_id,
                    requested: request.quantity,
                    available,
                })
            }
        }
    };

    let note = match note {
        Some(text) => format!("{} - {}", actor.name, text),
        None => format!("{} - {}", actor.name, movement_action(request.transaction_type)),
    };

    Ok(ledger
        .append(NewLedgerEntry {
            inventory_id,
            product_id: request.product_id,
            transaction_type: request.transaction_type,
            quantity: request.quantity,
            price: request.price,
            note: Some(note),
            production_log_id: None,
        })
        .await?)
}

/// Service for reading stock levels and recording manual movements
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists inventory records ordered by product id. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory::Model>, u64), ServiceError> {
        let paginator = Inventory::find()
            .order_by_asc(inventory::Column::ProductId)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((records, total))
    }

    #[instrument(skip(self))]
    pub async fn get_inventory(&self, product_id: Uuid) -> Result<inventory::Model, ServiceError> {
        SeaOrmInventoryRepository::new(self.db_pool.as_ref())
            .find(product_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No inventory record for product {}", product_id))
            })
    }

    /// Records a manual movement and its ledger row in one transaction.
    #[instrument(skip(self, request), fields(actor_id = %actor.id, product_id = %request.product_id))]
    pub async fn record_movement(
        &self,
        actor: &Actor,
        request: StockMovementRequest,
    ) -> Result<inventory_transaction::Model, ServiceError> {
        let started = Instant::now();
        let txn = self.db_pool.begin().await?;

        let result = record_stock_movement(
            &SeaOrmInventoryRepository::new(&txn),
            &SeaOrmLedgerRepository::new(&txn),
            actor,
            request,
        )
        .await;

        let row = match result {
            Ok(row) => {
                db::commit_tracked(txn, "record_stock_movement", started).await?;
                row
            }
            Err(e) => {
                drop(txn);
                db::record_rollback("record_stock_movement", started);
                warn!(error = %e, "stock movement rejected");
                return Err(e);
            }
        };

        counter!("foodstock_inventory.movements", 1, "type" => row.r#type.as_str());
        info!(transaction_id = %row.id, quantity = row.quantity, "stock movement recorded");

        self.event_sender
            .send_or_log([Event::StockMovementRecorded {
                transaction_id: row.id,
                product_id: row.product_id,
                transaction_type: row.r#type,
                quantity: row.quantity,
                production_log_id: None,
            }]);

        Ok(row)
    }

    /// Ledger rows matching `query`, newest first.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        query: LedgerQuery,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_transaction::Model>, u64), ServiceError> {
        let mut select = InventoryTransaction::find();
        if let Some(product_id) = query.product_id {
            select = select.filter(inventory_transaction::Column::ProductId.eq(product_id));
        }
        if let Some(log_id) = query.production_log_id {
            select = select.filter(inventory_transaction::Column::ProductionLogId.eq(log_id));
        }
        if let Some(transaction_type) = query.transaction_type {
            select = select.filter(inventory_transaction::Column::Type.eq(transaction_type));
        }

        let paginator = select
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .order_by_desc(inventory_transaction::Column::Id)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryStore;
    use assert_matches::assert_matches;

    fn movement(product_id: Uuid, transaction_type: TransactionType, quantity: i64) -> StockMovementRequest {
        StockMovementRequest {
            product_id,
            transaction_type,
            quantity,
            price: 250,
            note: None,
        }
    }

    #[tokio::test]
    async fn import_creates_record_and_ledger_row() {
        let p = Uuid::new_v4();
        let store = MemoryStore::default();

        let row = record_stock_movement(&store, &store, &Actor::new("u", "Kim"), movement(p, TransactionType::Import, 12))
            .await
            .unwrap();

        assert_eq!(store.quantity(p), Some(12));
        assert_eq!(row.price, 250);
        assert_eq!(row.production_log_id, None);
        assert_eq!(row.note.as_deref(), Some("Kim - stock import"));
    }

    #[tokio::test]
    async fn damaged_return_debits_with_shortage_check() {
        let p = Uuid::new_v4();
        let store = MemoryStore::with_stock(&[(p, 3)]);
        let actor = Actor::new("u", "Kim");

        let err = record_stock_movement(&store, &store, &actor, movement(p, TransactionType::ReturnDamaged, 4))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InsufficientStock { available: 3, .. });

        let mut req = movement(p, TransactionType::ReturnDamaged, 3);
        req.note = Some("  crushed pallet ".into());
        let row = record_stock_movement(&store, &store, &actor, req).await.unwrap();
        assert_eq!(store.quantity(p), Some(0));
        assert_eq!(row.note.as_deref(), Some("Kim - crushed pallet"));
    }

    #[tokio::test]
    async fn export_of_unknown_product_is_missing() {
        let store = MemoryStore::default();
        let err = record_stock_movement(
            &store,
            &store,
            &Actor::new("u", "Kim"),
            movement(Uuid::new_v4(), TransactionType::Export, 1),
        )
        .await
        .unwrap_err();
        assert_matches!(err, ServiceError::MissingInventoryRecord { .. });
    }

    #[tokio::test]
    async fn bad_quantity_or_price_is_rejected() {
        let p = Uuid::new_v4();
        let store = MemoryStore::default();
        let actor = Actor::new("u", "Kim");

        let zero = movement(p, TransactionType::Import, 0);
        assert_matches!(
            record_stock_movement(&store, &store, &actor, zero).await,
            Err(ServiceError::ValidationError(_))
        );

        let mut negative_price = movement(p, TransactionType::Import, 1);
        negative_price.price = -1;
        assert_matches!(
            record_stock_movement(&store, &store, &actor, negative_price).await,
            Err(ServiceError::ValidationError(_))
        );
        assert!(store.ledger().is_empty());
    }
}
