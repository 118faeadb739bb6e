//! # vendo-core: Pure Business Logic for the Vendo Marketplace
//!
//! This crate is the heart of Vendo, a vending-machine marketplace where
//! sellers list products and buyers deposit coins, purchase products and
//! receive change. It contains all business logic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Vendo Architecture                           │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │          API / routing layer (external collaborator)        │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │               ★ vendo-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │  ┌────────┐ ┌────────┐ ┌──────────┐ ┌────────────────────┐ │   │
//! │  │  │ money  │ │ coins  │ │  types   │ │      purchase      │ │   │
//! │  │  │ Money  │ │CoinSet │ │User      │ │ validate + plan    │ │   │
//! │  │  │        │ │greedy  │ │Product   │ │ the multi-product  │ │   │
//! │  │  │        │ │change  │ │Role      │ │ buy                │ │   │
//! │  │  └────────┘ └────────┘ └──────────┘ └────────────────────┘ │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │                 vendo-db (Database Layer)                   │   │
//! │  │      SQLite repositories + the transactional store          │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Product, Role)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`coins`] - Coin set, deposit validation and greedy change-making
//! - [`purchase`] - Purchase request validation and planning
//! - [`access`] - Role and ownership guards
//! - [`validation`] - Field-level input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: database, network and file system access are forbidden here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example
//!
//! ```rust
//! use vendo_core::coins::CoinSet;
//! use vendo_core::money::Money;
//!
//! let coins = CoinSet::default();
//!
//! // A balance of 80 comes back as one 50, one 20 and one 10.
//! let change = coins.decompose(Money::from_cents(80)).unwrap();
//! let total: i64 = change.iter().map(|c| c.value * c.count).sum();
//! assert_eq!(total, 80);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod coins;
pub mod error;
pub mod money;
pub mod purchase;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vendo_core::Money` instead of
// `use vendo_core::money::Money`

pub use coins::{CoinCount, CoinSet};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use purchase::{PurchaseLine, PurchaseReceipt, PurchaseRequest};
pub use types::{Product, ProductPatch, Role, User};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Coin denominations the marketplace accepts by default, in the
/// smallest currency unit.
///
/// The process-wide coin configuration is an explicit [`CoinSet`] value
/// passed in at construction; this constant only seeds
/// `CoinSet::default()`.
pub const DEFAULT_COIN_VALUES: [i64; 5] = [5, 10, 20, 50, 100];
