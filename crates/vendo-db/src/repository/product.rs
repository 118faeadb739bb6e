//! # Product Repository
//!
//! Database operations for products and their stock levels.
//!
//! Stock is only ever changed through relative updates. The decrement
//! carries its own precondition (`amount_available >= qty`), so a
//! concurrent decrement can never push stock below zero; the CHECK
//! constraint in the schema backs this up at the storage layer.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vendo_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

pub(crate) const SELECT_PRODUCT: &str =
    "SELECT id, name, cost_cents, amount_available, seller_id, created_at, updated_at \
     FROM products";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - product found
    /// * `Ok(None)` - product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists all products, by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists one seller's products, by name.
    pub async fn list_by_seller(&self, seller_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE seller_id = ?1 ORDER BY name"
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products \
             (id, name, cost_cents, amount_available, seller_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.cost_cents)
        .bind(product.amount_available)
        .bind(&product.seller_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Saves an existing product's mutable fields (name, cost, stock).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product doesn't exist
    pub async fn save(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET name = ?2, cost_cents = ?3, amount_available = ?4, \
             updated_at = ?5 WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.cost_cents)
        .bind(product.amount_available)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Decrements a product's stock, guarded against overdraw.
    ///
    /// ## Returns
    /// * `Ok(true)` - decrement applied
    /// * `Ok(false)` - product missing or stock below `qty`; the caller
    ///   re-reads to tell the two apart
    pub async fn decrement_stock(&self, id: &str, qty: i64) -> DbResult<bool> {
        self.decrement_stock_in(&self.pool, id, qty).await
    }

    /// [`Self::decrement_stock`] against a caller-supplied executor, so
    /// the purchase commit can run the same statement inside its
    /// transaction.
    pub async fn decrement_stock_in<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: &str,
        qty: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, qty = %qty, "Decrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET amount_available = amount_available - ?2, updated_at = ?3 \
             WHERE id = ?1 AND amount_available >= ?2",
        )
        .bind(id)
        .bind(qty)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
