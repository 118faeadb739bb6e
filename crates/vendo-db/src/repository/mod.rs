//! # Repository Module
//!
//! Database repository implementations for the Vendo marketplace.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                               │
//! │                                                                     │
//! │  Store service                                                     │
//! │       │                                                             │
//! │       │  db.users().get_by_id("...")                               │
//! │       ▼                                                             │
//! │  UserRepository / ProductRepository                                │
//! │  ├── get_by_id / get_by_username / list                            │
//! │  ├── insert / save / delete                                        │
//! │  └── guarded relative updates (credit, debit, decrement)           │
//! │       │                                                             │
//! │       │  SQL                                                        │
//! │       ▼                                                             │
//! │  SQLite                                                            │
//! │                                                                     │
//! │  Benefits:                                                          │
//! │  • SQL is isolated in one place                                    │
//! │  • Callers depend on a capability, not a database client           │
//! │  • Easy to point at an in-memory database in tests                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded updates (`debit_deposit`, `decrement_stock`) implement
//! the per-record compare-and-swap this design requires: two concurrent
//! writers can never both read the same stale value and overdraw,
//! because the precondition travels inside the UPDATE itself.

pub mod product;
pub mod user;
