use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthError;

/// Audit text written on every successful login.
pub const LOGIN_ACTIVITY: &str = "User logged in";

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignUpInput {
    /// Presence check only; email format is not inspected.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (field, value) in [
            ("email", &self.email),
            ("password", &self.password),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

/// Registration echo; carries no id, password or hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpOutput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInOutput {
    pub token: String,
}

/// Identity record. `token` is `None` while logged out.
#[derive(Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub token: Option<String>,
}

impl User {
    pub fn new(email: &str, password_hash: String) -> Self {
        Self { id: Uuid::new_v4(), email: email.to_string(), password_hash, token: None }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl From<models::user::Model> for User {
    fn from(m: models::user::Model) -> Self {
        Self { id: m.id, email: m.email, password_hash: m.password, token: m.token }
    }
}

/// Profile record, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub user_id: Uuid,
}

impl Customer {
    pub fn new(user_id: Uuid, first_name: &str, last_name: &str) -> Self {
        Self { id: Uuid::new_v4(), first_name: first_name.to_string(), last_name: last_name.to_string(), user_id }
    }
}

impl From<models::customer::Model> for Customer {
    fn from(m: models::customer::Model) -> Self {
        Self { id: m.id, first_name: m.first_name, last_name: m.last_name, user_id: m.user_id }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub activity: String,
    pub customer_id: Uuid,
}

impl History {
    pub fn new(customer_id: Uuid, activity: &str) -> Self {
        Self { id: Uuid::new_v4(), date: Utc::now(), activity: activity.to_string(), customer_id }
    }

    pub fn login(customer_id: Uuid) -> Self {
        Self::new(customer_id, LOGIN_ACTIVITY)
    }
}

impl From<models::history::Model> for History {
    fn from(m: models::history::Model) -> Self {
        Self { id: m.id, date: m.date.with_timezone(&Utc), activity: m.activity, customer_id: m.customer_id }
    }
}

/// Combined user + customer view for the authenticated caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}
