//! Create `history` table: append-only audit entries per customer.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(History::Table)
                    .if_not_exists()
                    .col(uuid(History::Id).primary_key())
                    .col(timestamp_with_time_zone(History::Date).not_null())
                    .col(text(History::Activity).not_null())
                    .col(uuid(History::CustomerId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_history_customer")
                            .from(History::Table, History::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(History::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum History { Table, Id, Date, Activity, CustomerId }

#[derive(DeriveIden)]
enum Customer { Table, Id }
