//! # vendo-db: Database Layer for the Vendo Marketplace
//!
//! This crate provides persistence for Vendo. It uses SQLite for
//! storage with sqlx for async operations, and hosts the [`Store`]
//! service that joins vendo-core's pure logic to the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Vendo Data Flow                                 │
//! │                                                                         │
//! │  Caller (API layer, CLI, tests)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vendo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │     Store     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (store.rs)   │    │  (user.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │   product.rs) │    │              │  │   │
//! │  │   │ register/buy/ │───►│ guarded       │    │ 001_initial_ │  │   │
//! │  │   │ deposit/...   │    │ relative      │    │ schema.sql   │  │   │
//! │  │   │ + transaction │    │ updates       │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │     ┌──────────────┘                              │   │
//! │  │           ▼     ▼                                             │   │
//! │  │   ┌───────────────┐                                           │   │
//! │  │   │   Database    │  SqlitePool, WAL, foreign keys on         │   │
//! │  │   │   (pool.rs)   │                                           │   │
//! │  │   └───────────────┘                                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and store error types
//! - [`repository`] - Repository implementations (user, product)
//! - [`store`] - The marketplace store service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vendo_core::{CoinSet, Role};
//! use vendo_db::{Database, DbConfig, Store};
//!
//! let db = Database::new(DbConfig::new("path/to/vendo.db")).await?;
//! let store = Store::new(db, CoinSet::default());
//!
//! let buyer = store.register_user("alice", Role::Buyer).await?;
//! store.deposit(&buyer.id, 100).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use store::Store;

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
