//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! token issuance, password hashing, and the persistence layer.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL persistence via SeaORM

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, DatabaseConnections, InMemoryPostRepository, InMemoryStore,
    InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};
