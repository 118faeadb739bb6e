//! # Error Types
//!
//! Domain-specific error types for vendo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  vendo-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                   │
//! │  └── ValidationError  - Input validation failures                  │
//! │                                                                     │
//! │  vendo-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                │
//! │  └── StoreError       - Core + Db + commit conflicts               │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → StoreError → caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts, supported coins)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to a stable caller-visible message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. The boundary layer catches
/// them and translates each to a caller-visible response; the core never
/// retries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User id is unknown.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Product id is unknown.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Username already registered (matching is case-insensitive).
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// The same product id appears more than once in one purchase request.
    #[error("Product {0} is duplicated in the purchase request")]
    DuplicateProduct(String),

    /// Requested quantity exceeds available stock.
    ///
    /// ## When This Occurs
    /// - A purchase line asks for more units than the product has
    /// - Stock changed between validation and commit (fatal, see store)
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Buyer's deposit does not cover the amount.
    #[error("Insufficient funds: deposit {deposit}, required {required}")]
    InsufficientFunds { deposit: i64, required: i64 },

    /// A line or request total does not fit in 64-bit cents.
    ///
    /// Rejected during planning, before the funds check, so a wrapped
    /// total can never reach the commit phase.
    #[error("Cost out of range for product {product_id}")]
    CostOutOfRange { product_id: String },

    /// Deposited value is not one of the configured coin denominations.
    #[error("Coin value {value} is not supported; supported coins: {supported:?}")]
    UnsupportedDenomination { value: i64, supported: Vec<i64> },

    /// Amount cannot be expressed with the configured coin set.
    ///
    /// Deposits are restricted to supported denominations, and a
    /// purchase that would leave an undecomposable balance is rolled
    /// back, so every stored balance is representable. Callers treat
    /// this error as internal.
    #[error("Amount {amount} cannot be represented with coins {coins:?} (stuck at remainder {remainder})")]
    UnrepresentableAmount {
        amount: i64,
        remainder: i64,
        coins: Vec<i64>,
    },

    /// Actor is not allowed to perform the operation.
    #[error("Actor {actor_id} is not allowed to {action}")]
    Forbidden { actor_id: String, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be a positive number")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
