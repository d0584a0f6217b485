use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::customer;

/// Append-only audit entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text")]
    pub activity: String,
    pub customer_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Customer }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn record<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    customer_id: Uuid,
    activity: &str,
    date: DateTimeWithTimeZone,
) -> Result<Model, ModelError> {
    if activity.trim().is_empty() { return Err(ModelError::Validation("activity required".into())); }
    let am = ActiveModel {
        id: Set(id),
        date: Set(date),
        activity: Set(activity.to_string()),
        customer_id: Set(customer_id),
    };
    Ok(am.insert(db).await?)
}

/// Entries for one customer, newest first.
pub async fn list_by_customer<C: ConnectionTrait>(db: &C, customer_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::CustomerId.eq(customer_id))
        .order_by_desc(Column::Date)
        .all(db)
        .await?)
}
