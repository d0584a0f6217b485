use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use super::domain::{Customer, History, User};
use super::errors::AuthError;

/// Persistence seam for accounts.
///
/// Reads outside a unit of work see committed state only. Every write goes
/// through a [`UnitOfWork`] obtained from [`AccountStore::begin`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AuthError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    async fn find_customer_by_user(&self, user_id: Uuid) -> Result<Option<Customer>, AuthError>;
    async fn list_history(&self, customer_id: Uuid) -> Result<Vec<History>, AuthError>;
}

/// A group of writes that commit or roll back together.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every write made through it.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Fails with [`AuthError::Conflict`] when the email is taken.
    async fn insert_user(&mut self, user: &User) -> Result<(), AuthError>;
    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), AuthError>;
    /// `None` clears the session token.
    async fn set_user_token(&mut self, user_id: Uuid, token: Option<&str>) -> Result<(), AuthError>;
    async fn find_customer_by_user(&mut self, user_id: Uuid) -> Result<Option<Customer>, AuthError>;
    async fn insert_history(&mut self, entry: &History) -> Result<(), AuthError>;

    async fn commit(self: Box<Self>) -> Result<(), AuthError>;
    async fn rollback(self: Box<Self>) -> Result<(), AuthError>;
}

/// Commit when `outcome` is `Ok`, otherwise roll back and return the original error.
pub async fn complete<T>(uow: Box<dyn UnitOfWork>, outcome: Result<T, AuthError>) -> Result<T, AuthError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = uow.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e)
        }
    }
}

/// In-memory store for tests, benches and doc examples.
///
/// Writes are staged per unit of work and applied atomically on commit, with
/// email and customer-per-user uniqueness re-checked at that point.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Step at which the next unit of work should fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailPoint {
        InsertUser,
        InsertCustomer,
        SetToken,
        InsertHistory,
        Commit,
    }

    #[derive(Default)]
    struct Tables {
        users: HashMap<Uuid, User>,
        customers: HashMap<Uuid, Customer>,
        history: Vec<History>,
    }

    #[derive(Default)]
    struct Inner {
        tables: Mutex<Tables>,
        fail: Mutex<Option<FailPoint>>,
        begins: AtomicUsize,
    }

    impl Inner {
        fn check(&self, at: FailPoint) -> Result<(), AuthError> {
            if *self.fail.lock().unwrap() == Some(at) {
                return Err(AuthError::Repository(format!("injected failure at {at:?}")));
            }
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct MockAccountStore {
        inner: Arc<Inner>,
    }

    impl MockAccountStore {
        pub fn fail_at(&self, at: Option<FailPoint>) {
            *self.inner.fail.lock().unwrap() = at;
        }

        /// Number of units of work opened so far.
        pub fn begins(&self) -> usize {
            self.inner.begins.load(Ordering::SeqCst)
        }

        pub fn users(&self) -> Vec<User> {
            self.inner.tables.lock().unwrap().users.values().cloned().collect()
        }

        pub fn customers(&self) -> Vec<Customer> {
            self.inner.tables.lock().unwrap().customers.values().cloned().collect()
        }

        pub fn history(&self) -> Vec<History> {
            self.inner.tables.lock().unwrap().history.clone()
        }

        pub fn user_by_email(&self, email: &str) -> Option<User> {
            self.inner.tables.lock().unwrap().users.values().find(|u| u.email == email).cloned()
        }

        /// Overwrite a stored password digest, e.g. with a corrupted value.
        pub fn replace_password_hash(&self, user_id: Uuid, digest: &str) {
            if let Some(u) = self.inner.tables.lock().unwrap().users.get_mut(&user_id) {
                u.password_hash = digest.to_string();
            }
        }

        /// Drop a user's customer row, breaking the one-to-one invariant.
        pub fn remove_customer_of(&self, user_id: Uuid) {
            self.inner.tables.lock().unwrap().customers.retain(|_, c| c.user_id != user_id);
        }
    }

    #[async_trait]
    impl AccountStore for MockAccountStore {
        async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AuthError> {
            self.inner.begins.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockUnitOfWork { inner: Arc::clone(&self.inner), staged: Vec::new() }))
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
            Ok(self.user_by_email(email))
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
            Ok(self.inner.tables.lock().unwrap().users.get(&id).cloned())
        }

        async fn find_customer_by_user(&self, user_id: Uuid) -> Result<Option<Customer>, AuthError> {
            let tables = self.inner.tables.lock().unwrap();
            Ok(tables.customers.values().find(|c| c.user_id == user_id).cloned())
        }

        async fn list_history(&self, customer_id: Uuid) -> Result<Vec<History>, AuthError> {
            let tables = self.inner.tables.lock().unwrap();
            let mut entries: Vec<History> = tables.history.iter().filter(|h| h.customer_id == customer_id).cloned().collect();
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(entries)
        }
    }

    enum Staged {
        User(User),
        Customer(Customer),
        Token(Uuid, Option<String>),
        History(History),
    }

    pub struct MockUnitOfWork {
        inner: Arc<Inner>,
        staged: Vec<Staged>,
    }

    impl MockUnitOfWork {
        fn staged_user(&self, id: Uuid) -> bool {
            self.staged.iter().any(|s| matches!(s, Staged::User(u) if u.id == id))
        }
    }

    fn validate(tables: &Tables, staged: &[Staged]) -> Result<(), AuthError> {
        let mut emails: Vec<&str> = Vec::new();
        let mut owners: Vec<Uuid> = Vec::new();
        for s in staged {
            match s {
                Staged::User(u) => {
                    if tables.users.values().any(|x| x.email == u.email) || emails.contains(&u.email.as_str()) {
                        return Err(AuthError::Conflict);
                    }
                    emails.push(&u.email);
                }
                Staged::Customer(c) => {
                    if tables.customers.values().any(|x| x.user_id == c.user_id) || owners.contains(&c.user_id) {
                        return Err(AuthError::Conflict);
                    }
                    owners.push(c.user_id);
                }
                Staged::Token(..) | Staged::History(_) => {}
            }
        }
        Ok(())
    }

    #[async_trait]
    impl UnitOfWork for MockUnitOfWork {
        async fn insert_user(&mut self, user: &User) -> Result<(), AuthError> {
            self.inner.check(FailPoint::InsertUser)?;
            let taken_committed = self.inner.tables.lock().unwrap().users.values().any(|u| u.email == user.email);
            let taken_staged = self.staged.iter().any(|s| matches!(s, Staged::User(u) if u.email == user.email));
            if taken_committed || taken_staged {
                return Err(AuthError::Conflict);
            }
            self.staged.push(Staged::User(user.clone()));
            Ok(())
        }

        async fn insert_customer(&mut self, customer: &Customer) -> Result<(), AuthError> {
            self.inner.check(FailPoint::InsertCustomer)?;
            self.staged.push(Staged::Customer(customer.clone()));
            Ok(())
        }

        async fn set_user_token(&mut self, user_id: Uuid, token: Option<&str>) -> Result<(), AuthError> {
            self.inner.check(FailPoint::SetToken)?;
            let known = self.inner.tables.lock().unwrap().users.contains_key(&user_id) || self.staged_user(user_id);
            if !known {
                return Err(AuthError::NotFound);
            }
            self.staged.push(Staged::Token(user_id, token.map(str::to_string)));
            Ok(())
        }

        async fn find_customer_by_user(&mut self, user_id: Uuid) -> Result<Option<Customer>, AuthError> {
            let staged = self.staged.iter().rev().find_map(|s| match s {
                Staged::Customer(c) if c.user_id == user_id => Some(c.clone()),
                _ => None,
            });
            if staged.is_some() {
                return Ok(staged);
            }
            let tables = self.inner.tables.lock().unwrap();
            Ok(tables.customers.values().find(|c| c.user_id == user_id).cloned())
        }

        async fn insert_history(&mut self, entry: &History) -> Result<(), AuthError> {
            self.inner.check(FailPoint::InsertHistory)?;
            self.staged.push(Staged::History(entry.clone()));
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), AuthError> {
            self.inner.check(FailPoint::Commit)?;
            let MockUnitOfWork { inner, staged } = *self;
            let mut tables = inner.tables.lock().unwrap();
            validate(&tables, &staged)?;
            for s in staged {
                match s {
                    Staged::User(u) => {
                        tables.users.insert(u.id, u);
                    }
                    Staged::Customer(c) => {
                        tables.customers.insert(c.id, c);
                    }
                    Staged::Token(id, token) => {
                        if let Some(u) = tables.users.get_mut(&id) {
                            u.token = token;
                        }
                    }
                    Staged::History(h) => tables.history.push(h),
                }
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), AuthError> {
            Ok(())
        }
    }
}
