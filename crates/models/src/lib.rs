//! SeaORM entities for the account schema plus connection helpers.

pub mod errors;
pub mod db;
pub mod user;
pub mod customer;
pub mod history;

#[cfg(test)]
mod tests;
