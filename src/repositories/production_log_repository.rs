use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::ProductionLogRepository;
use crate::entities::{production_log, production_log_item, ItemKind};
use crate::models::{LineItem, NewProductionLog, ProductionLog};

/// Rows per multi-row insert; six binds each keeps a chunk under SQLite's
/// 32766 parameter limit.
const ITEM_INSERT_CHUNK: usize = 1000;

/// sea-orm backed production log store. Items are kept in a child table with
/// an explicit position so merged order survives the round trip.
pub struct SeaOrmProductionLogRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C> SeaOrmProductionLogRepository<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductionLog>, DbErr> {
        let Some(header) = production_log::Entity::find_by_id(id).one(self.conn).await? else {
            return Ok(None);
        };
        let mut items = self.load_items(&[id]).await?;
        Ok(Some(assemble(header, items.remove(&id).unwrap_or_default())))
    }

    /// Newest first. `page` is 1-based.
    pub async fn find_page(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductionLog>, u64), DbErr> {
        let paginator = production_log::Entity::find()
            .order_by_desc(production_log::Column::CreatedAt)
            .order_by_desc(production_log::Column::Id)
            .paginate(self.conn, per_page);

        let total = paginator.num_items().await?;
        let headers = paginator.fetch_page(page.saturating_sub(1)).await?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut items = self.load_items(&ids).await?;
        let logs = headers
            .into_iter()
            .map(|header| {
                let lines = items.remove(&header.id).unwrap_or_default();
                assemble(header, lines)
            })
            .collect();

        Ok((logs, total))
    }

    async fn load_items(
        &self,
        log_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<production_log_item::Model>>, DbErr> {
        if log_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = production_log_item::Entity::find()
            .filter(production_log_item::Column::ProductionLogId.is_in(log_ids.iter().copied()))
            .order_by_asc(production_log_item::Column::Position)
            .all(self.conn)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<production_log_item::Model>> = HashMap::new();
        for row in rows {
            grouped.entry(row.production_log_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

fn assemble(header: production_log::Model, rows: Vec<production_log_item::Model>) -> ProductionLog {
    let mut ingredient_item = Vec::new();
    let mut output_item = Vec::new();
    for row in rows {
        let line = LineItem::new(row.product_id, row.quantity);
        match row.kind {
            ItemKind::Ingredient => ingredient_item.push(line),
            ItemKind::Output => output_item.push(line),
        }
    }

    ProductionLog {
        id: header.id,
        output_item,
        ingredient_item,
        actor_id: header.actor_id,
        actor_name: header.actor_name,
        created_at: header.created_at,
    }
}

fn item_rows(log_id: Uuid, kind: ItemKind, lines: &[LineItem]) -> Vec<production_log_item::ActiveModel> {
    lines
        .iter()
        .enumerate()
        .map(|(position, line)| production_log_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            production_log_id: Set(log_id),
            kind: Set(kind),
            position: Set(position as i32),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
        })
        .collect()
}

#[async_trait]
impl<'a, C> ProductionLogRepository for SeaOrmProductionLogRepository<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn insert(&self, log: NewProductionLog) -> Result<ProductionLog, DbErr> {
        let header = production_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(log.actor.id),
            actor_name: Set(log.actor.name),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        let mut rows = item_rows(header.id, ItemKind::Ingredient, &log.ingredient_items);
        rows.extend(item_rows(header.id, ItemKind::Output, &log.output_items));
        for chunk in rows.chunks(ITEM_INSERT_CHUNK) {
            production_log_item::Entity::insert_many(chunk.iter().cloned())
                .exec_without_returning(self.conn)
                .await?;
        }

        Ok(ProductionLog {
            id: header.id,
            output_item: log.output_items,
            ingredient_item: log.ingredient_items,
            actor_id: header.actor_id,
            actor_name: header.actor_name,
            created_at: header.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::models::Actor;

    #[tokio::test]
    async fn items_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig {
            url: format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("logs.sqlite").display()
            ),
            max_connections: 1,
            ..Default::default()
        };
        let pool = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SeaOrmProductionLogRepository::new(&pool);

        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let saved = repo
            .insert(NewProductionLog {
                actor: Actor::new("u-1", "Mai"),
                ingredient_items: vec![LineItem::new(b, 2), LineItem::new(a, 1)],
                output_items: vec![LineItem::new(c, 9)],
            })
            .await
            .unwrap();

        let loaded = repo.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.ingredient_item, vec![LineItem::new(b, 2), LineItem::new(a, 1)]);
        assert_eq!(loaded.output_item, vec![LineItem::new(c, 9)]);
        assert_eq!(loaded.actor_name, "Mai");

        let (page, total) = repo.find_page(1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, saved.id);

        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn runs_with_thousands_of_lines_are_stored_whole() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig {
            url: format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("wide.sqlite").display()
            ),
            max_connections: 1,
            ..Default::default()
        };
        let pool = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SeaOrmProductionLogRepository::new(&pool);

        let outputs: Vec<LineItem> = (0..6_000)
            .map(|i| LineItem::new(Uuid::new_v4(), i + 1))
            .collect();
        let saved = repo
            .insert(NewProductionLog {
                actor: Actor::new("u-1", "Mai"),
                ingredient_items: vec![LineItem::new(Uuid::new_v4(), 3)],
                output_items: outputs.clone(),
            })
            .await
            .unwrap();

        let loaded = repo.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.output_item, outputs);
        assert_eq!(loaded.ingredient_item.len(), 1);
    }
}
