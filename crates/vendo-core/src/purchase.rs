//! # Purchase Planning
//!
//! The pure half of the purchase transaction: request shapes, validation
//! and cost totalling. The commit half (stock decrements, deposit debit,
//! one storage transaction) lives in vendo-db's store, which feeds the
//! plan produced here into the database.
//!
//! ## Transaction States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │            Validating ──────────► Committing ──────► Succeeded     │
//! │                │                      │                             │
//! │                ▼                      ▼                             │
//! │             Failed                 Failed                           │
//! │     (abort, no side effects)  (must not happen under correct       │
//! │                                validation; the store treats it as  │
//! │                                fatal and rolls everything back)    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All validation is front-loaded: once a [`PurchasePlan`] exists, no
//! business rule can fail during commit. Anything that still goes wrong
//! mid-commit is a storage-level conflict, not a plannable outcome.

use serde::{Deserialize, Serialize};

use crate::coins::CoinCount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, User};
use crate::validation::validate_quantity;

// =============================================================================
// Request / Response Shapes
// =============================================================================

/// One line of a purchase request.
///
/// Wire shape: `{"productId": "...", "productAmount": 2}`. The i64 type
/// carries the "numeric and integral" rule; presence is carried by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    /// Product to buy.
    pub product_id: String,
    /// Units to buy. Must be positive.
    pub product_amount: i64,
}

/// A multi-product purchase request.
///
/// Invariant: no duplicate `product_id` within one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub products: Vec<PurchaseLine>,
}

/// The outcome of a successful purchase.
///
/// Wire shape: `{"totalSpent": 120, "change": [{"value": 50, "count": 1}, ...],
/// "purchasedProducts": [...]}`. Products are post-decrement snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Total cost debited from the buyer, in cents.
    pub total_spent: Money,
    /// The buyer's remaining balance rendered as coins.
    pub change: Vec<CoinCount>,
    /// Bought products after their stock was decremented.
    pub purchased_products: Vec<Product>,
}

// =============================================================================
// Purchase Plan
// =============================================================================

/// One validated line, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
    pub line_total: Money,
}

/// A fully validated purchase: every business rule has passed and the
/// commit phase only has to apply the writes.
#[derive(Debug, Clone)]
pub struct PurchasePlan {
    /// Sum of all line totals.
    pub total: Money,
    /// One entry per request line, in request order.
    pub lines: Vec<PlannedLine>,
}

// =============================================================================
// Validation (steps 1-3: structure)
// =============================================================================

/// Validates the structure of a purchase request.
///
/// Checks, in order: the list is non-empty; every line has a product id
/// and a positive quantity; no product id repeats. Runs before any
/// product is loaded, so a malformed request costs no reads.
///
/// ## Errors
/// - [`ValidationError::Required`] for an empty list or blank product id
/// - [`ValidationError::MustBePositive`] for a non-positive quantity
/// - [`CoreError::DuplicateProduct`] for a repeated product id
pub fn validate_request(request: &PurchaseRequest) -> CoreResult<()> {
    if request.products.is_empty() {
        return Err(ValidationError::Required {
            field: "products".to_string(),
        }
        .into());
    }

    for (index, line) in request.products.iter().enumerate() {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "productId".to_string(),
            }
            .into());
        }

        validate_quantity(line.product_amount)?;

        let duplicated = request.products[..index]
            .iter()
            .any(|earlier| earlier.product_id == line.product_id);
        if duplicated {
            return Err(CoreError::DuplicateProduct(line.product_id.clone()));
        }
    }

    Ok(())
}

// =============================================================================
// Planning (steps 3-5: stock, totals, funds)
// =============================================================================

/// Builds a purchase plan from a validated request and the loaded
/// products.
///
/// `products` must be aligned with `request.products` (one product per
/// line, in order); the store builds it by resolving each line's id.
/// Checks stock per line, totals the cost and checks the buyer's funds.
///
/// ## Errors
/// - [`CoreError::InsufficientStock`] when a line exceeds available stock
/// - [`CoreError::CostOutOfRange`] when a line or the request total
///   overflows 64-bit cents
/// - [`CoreError::InsufficientFunds`] when the deposit is below the total
pub fn plan_purchase(
    buyer: &User,
    request: &PurchaseRequest,
    products: &[Product],
) -> CoreResult<PurchasePlan> {
    debug_assert_eq!(request.products.len(), products.len());

    let mut lines = Vec::with_capacity(request.products.len());

    for (line, product) in request.products.iter().zip(products) {
        if !product.has_stock(line.product_amount) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                available: product.amount_available,
                requested: line.product_amount,
            });
        }

        let unit_cost = product.cost();
        let line_total = unit_cost
            .checked_mul(line.product_amount)
            .ok_or_else(|| CoreError::CostOutOfRange {
                product_id: product.id.clone(),
            })?;

        lines.push(PlannedLine {
            product_id: product.id.clone(),
            quantity: line.product_amount,
            unit_cost,
            line_total,
        });
    }

    let mut total = Money::zero();
    for planned in &lines {
        total = total
            .checked_add(planned.line_total)
            .ok_or_else(|| CoreError::CostOutOfRange {
                product_id: planned.product_id.clone(),
            })?;
    }

    if buyer.deposit() < total {
        return Err(CoreError::InsufficientFunds {
            deposit: buyer.deposit_cents,
            required: total.cents(),
        });
    }

    Ok(PurchasePlan { total, lines })
}

// =============================================================================
// Unit Tests
// =============================================================================
