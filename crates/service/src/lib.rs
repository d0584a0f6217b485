//! Service layer for account authentication.
//! - Separates business logic from data access (`AccountStore` seam).
//! - Reuses entity definitions in the `models` crate for the SeaORM store.
//! - Provides clear error types and documented interfaces.

pub mod auth;
#[cfg(test)]
pub mod test_support;
