use super::LineItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who is recording a stock change, as captured for audit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&crate::auth::AuthUser> for Actor {
    fn from(user: &crate::auth::AuthUser) -> Self {
        Self::new(user.user_id.clone(), user.display_name())
    }
}

/// A production run to persist: merged item lists plus the recording actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductionLog {
    pub actor: Actor,
    pub ingredient_items: Vec<LineItem>,
    pub output_items: Vec<LineItem>,
}

/// A recorded production run with its merged, ordered item lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionLog {
    pub id: Uuid,
    pub output_item: Vec<LineItem>,
    pub ingredient_item: Vec<LineItem>,
    pub actor_id: String,
    pub actor_name: String,
    pub created_at: DateTime<Utc>,
}
