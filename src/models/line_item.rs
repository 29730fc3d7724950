use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Upper bound on a single request line; keeps merged sums far from overflow.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000_000;

/// One `{productId, quantity}` line of a production request or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(product_id: Uuid, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }

    /// Whether the quantity lies in `1..=MAX_LINE_QUANTITY`.
    pub fn has_valid_quantity(&self) -> bool {
        (1..=MAX_LINE_QUANTITY).contains(&self.quantity)
    }
}

/// Coalesces repeated products into one line each, summing quantities and
/// keeping the order in which each product first appeared.
///
/// Quantities are not filtered here; rejecting non-positive lines is the
/// caller's job.
pub fn merge_line_items(items: &[LineItem]) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(items.len());

    for item in items {
        match index.get(&item.product_id) {
            Some(&pos) => {
                merged[pos].quantity = merged[pos].quantity.saturating_add(item.quantity);
            }
            None => {
                index.insert(item.product_id, merged.len());
                merged.push(*item);
            }
        }
    }

    merged
}
