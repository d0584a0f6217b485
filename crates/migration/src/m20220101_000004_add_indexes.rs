use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // History: lookups by customer, newest first
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_history_customer_date")
                    .table(History::Table)
                    .col(History::CustomerId)
                    .col(History::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_history_customer_date").table(History::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum History { Table, CustomerId, Date }
