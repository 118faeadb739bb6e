//! # Access Guards
//!
//! Role and ownership checks, evaluated by the caller before a core
//! operation runs. The core itself stays free of identity concerns
//! beyond accepting a pre-authorized actor id.

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, Role, User};

/// Requires the user to hold the given role.
///
/// Deposits, withdrawals, resets and purchases are buyer-only; listing
/// products is seller-only.
pub fn ensure_role(user: &User, role: Role, action: &str) -> CoreResult<()> {
    if user.role == role {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            actor_id: user.id.clone(),
            action: action.to_string(),
        })
    }
}

/// Requires the actor to be the product's seller.
///
/// Products are mutated only by their owner; the catalog exposes
/// `seller_id` exactly so this check is possible.
pub fn ensure_product_owner(product: &Product, actor_id: &str, action: &str) -> CoreResult<()> {
    if product.seller_id == actor_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            actor_id: actor_id.to_string(),
            action: format!("{} product {}", action, product.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            username: id.to_string(),
            role,
            deposit_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(seller_id: &str) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Cola".to_string(),
            cost_cents: 15,
            amount_available: 10,
            seller_id: seller_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ensure_role() {
        let buyer = user("u-1", Role::Buyer);
        assert!(ensure_role(&buyer, Role::Buyer, "deposit").is_ok());

        let err = ensure_role(&buyer, Role::Seller, "create a product").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[test]
    fn test_ensure_product_owner() {
        let p = product("s-1");
        assert!(ensure_product_owner(&p, "s-1", "update").is_ok());

        let err = ensure_product_owner(&p, "s-2", "delete").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }
}
