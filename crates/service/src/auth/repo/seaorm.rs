use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use models::errors::ModelError;
use crate::auth::domain::{Customer, History, User};
use crate::auth::errors::AuthError;
use crate::auth::repository::{AccountStore, UnitOfWork};

/// Postgres-backed store. Each unit of work is one database transaction;
/// SeaORM rolls an unfinished transaction back when it is dropped.
pub struct SeaOrmAccountStore {
    pub db: DatabaseConnection,
}

impl SeaOrmAccountStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn db_err(e: sea_orm::DbErr) -> AuthError {
    AuthError::from(ModelError::from(e))
}

#[async_trait::async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AuthError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(Box::new(SeaOrmUnitOfWork { txn }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let found = models::user::find_by_email(&self.db, email).await?;
        Ok(found.map(User::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let found = models::user::find_by_id(&self.db, id).await?;
        Ok(found.map(User::from))
    }

    async fn find_customer_by_user(&self, user_id: Uuid) -> Result<Option<Customer>, AuthError> {
        let found = models::customer::find_by_user_id(&self.db, user_id).await?;
        Ok(found.map(Customer::from))
    }

    async fn list_history(&self, customer_id: Uuid) -> Result<Vec<History>, AuthError> {
        let rows = models::history::list_by_customer(&self.db, customer_id).await?;
        Ok(rows.into_iter().map(History::from).collect())
    }
}

pub struct SeaOrmUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait::async_trait]
impl UnitOfWork for SeaOrmUnitOfWork {
    async fn insert_user(&mut self, user: &User) -> Result<(), AuthError> {
        models::user::insert(&self.txn, user.id, &user.email, &user.password_hash).await?;
        Ok(())
    }

    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), AuthError> {
        models::customer::insert(&self.txn, customer.id, customer.user_id, &customer.first_name, &customer.last_name).await?;
        Ok(())
    }

    async fn set_user_token(&mut self, user_id: Uuid, token: Option<&str>) -> Result<(), AuthError> {
        models::user::set_token(&self.txn, user_id, token.map(str::to_string)).await?;
        Ok(())
    }

    async fn find_customer_by_user(&mut self, user_id: Uuid) -> Result<Option<Customer>, AuthError> {
        let found = models::customer::find_by_user_id(&self.txn, user_id).await?;
        Ok(found.map(Customer::from))
    }

    async fn insert_history(&mut self, entry: &History) -> Result<(), AuthError> {
        models::history::record(&self.txn, entry.id, entry.customer_id, &entry.activity, entry.date.into()).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AuthError> {
        self.txn.commit().await.map_err(db_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), AuthError> {
        self.txn.rollback().await.map_err(db_err)
    }
}
