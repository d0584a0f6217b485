//! Auth module: domain, hashing/token primitives, store abstraction, service.
//!
//! SignUp, LogIn and LogOut each run as one unit of work against an
//! [`repository::AccountStore`].

pub mod domain;
pub mod errors;
pub mod hasher;
pub mod token;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{AuthConfig, AuthService};
