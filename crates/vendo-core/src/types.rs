//! # Domain Types
//!
//! Core domain types for the Vendo marketplace.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌─────────────────┐       ┌─────────────────┐                     │
//! │  │      User       │       │     Product     │                     │
//! │  │  ─────────────  │       │  ─────────────  │                     │
//! │  │  id (UUID)      │◄──────│  seller_id      │                     │
//! │  │  username       │       │  id (UUID)      │                     │
//! │  │  role           │       │  name           │                     │
//! │  │  deposit_cents  │       │  cost_cents     │                     │
//! │  └─────────────────┘       │  amount_available│                    │
//! │                            └─────────────────┘                     │
//! │                                                                     │
//! │  seller_id is a reference, not in-memory ownership; the catalog    │
//! │  layer enforces who may mutate a product                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Users carry no credential: password hashing and session issuance are
//! the auth collaborator's concern and never enter this workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// The role a user registered with.
///
/// Buyers deposit coins and purchase products; sellers list and manage
/// products. Guards in [`crate::access`] enforce the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Deposits coins and buys products.
    Buyer,
    /// Lists products and manages their stock.
    Seller,
}

// =============================================================================
// User
// =============================================================================

/// A registered marketplace user.
///
/// Invariant: `deposit_cents >= 0` always. The deposit only grows by
/// adding a supported coin and only shrinks by purchase, withdrawal or
/// explicit reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique username, stored lowercase so matching is case-insensitive.
    pub username: String,

    /// Buyer or seller.
    pub role: Role,

    /// Running deposit balance in the smallest currency unit.
    pub deposit_cents: i64,

    /// When the user registered.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a fresh id and an empty deposit.
    ///
    /// The username is trimmed and lowercased here, so every stored
    /// username is already in canonical form.
    pub fn new(username: &str, role: Role) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_lowercase(),
            role,
            deposit_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the deposit as a Money value.
    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }

    /// Checks the buyer role.
    #[inline]
    pub fn is_buyer(&self) -> bool {
        self.role == Role::Buyer
    }

    /// Checks the seller role.
    #[inline]
    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product listed by a seller.
///
/// Invariant: `amount_available >= 0`. Stock is mutated only by its
/// seller (update/delete) or by a purchase transaction (decrement).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit cost in the smallest currency unit. Always positive.
    pub cost_cents: i64,

    /// Units currently in stock.
    pub amount_available: i64,

    /// Owning seller (referential only).
    pub seller_id: String,

    /// When the product was listed.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product listing with a fresh id.
    pub fn new(seller_id: &str, name: &str, cost_cents: i64, amount_available: i64) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            cost_cents,
            amount_available,
            seller_id: seller_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the unit cost as a Money value.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Checks whether the requested quantity is in stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        quantity <= self.amount_available
    }
}

// =============================================================================
// Product Patch
// =============================================================================

/// Partial update for a product.
///
/// Only name, cost and stock are mutable; identity and ownership are not.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub cost_cents: Option<i64>,
    pub amount_available: Option<i64>,
}

impl ProductPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.cost_cents.is_none() && self.amount_available.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
