//! # Marketplace Store
//!
//! The service layer joining vendo-core's pure logic to the SQLite
//! repositories. Every operation a caller can perform on the
//! marketplace goes through here: registration, deposits, the product
//! catalog and the multi-product purchase.
//!
//! ## Purchase Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  buy(buyer_id, request)                                             │
//! │                                                                     │
//! │  validate_request          structure only, no reads                 │
//! │       │                                                             │
//! │       ▼  BEGIN ──────────────────────────────────────────────────┐  │
//! │  load buyer + products     inside the transaction                │  │
//! │       │                                                          │  │
//! │  plan_purchase             stock, totals, funds (pure)           │  │
//! │       │                                                          │  │
//! │  guarded decrements        UPDATE ... WHERE stock >= qty         │  │
//! │  guarded debit             UPDATE ... WHERE deposit >= total     │  │
//! │       │                                                          │  │
//! │  re-read snapshots         post-decrement products, new balance  │  │
//! │  decompose change          still able to roll everything back    │  │
//! │       ▼  COMMIT ─────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before COMMIT drops the transaction, which rolls it back;
//! either every stock decrement and the deposit debit land together or
//! none of them do. A guard that fires inside the transaction means the
//! precondition established by planning vanished mid-commit, which the
//! isolation level rules out; it is reported as [`StoreError::CommitConflict`]
//! and treated as internal.
//!
//! Outside the purchase path, a failed guard is an ordinary race (a
//! concurrent withdrawal won); the store re-reads and reports the
//! precise domain error with current numbers.

use tracing::{debug, error, info};

use vendo_core::access::{ensure_product_owner, ensure_role};
use vendo_core::purchase::{plan_purchase, validate_request};
use vendo_core::validation::{
    validate_amount_available, validate_cost_cents, validate_product_name, validate_username,
};
use vendo_core::{
    CoinCount, CoinSet, CoreError, Money, Product, ProductPatch, PurchaseReceipt, PurchaseRequest,
    Role, User, ValidationError,
};

use crate::error::{DbError, StoreError, StoreResult};
use crate::pool::Database;
use crate::repository::product::SELECT_PRODUCT;
use crate::repository::user::SELECT_USER;

// =============================================================================
// Store
// =============================================================================

/// The marketplace store service.
///
/// Cheap to clone; all clones share the database pool and the coin
/// configuration.
#[derive(Debug, Clone)]
pub struct Store {
    db: Database,
    coins: CoinSet,
}

impl Store {
    /// Creates a store over the given database with the given coin set.
    pub fn new(db: Database, coins: CoinSet) -> Self {
        Store { db, coins }
    }

    /// Returns the configured coin denominations.
    pub fn coins(&self) -> &CoinSet {
        &self.coins
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Registers a new user with an empty deposit.
    ///
    /// The username is validated, then stored lowercase; two usernames
    /// differing only in case collide.
    ///
    /// ## Errors
    /// - [`CoreError::UsernameTaken`] if the username exists (checked
    ///   up front, and again via the unique index for the insert race)
    pub async fn register_user(&self, username: &str, role: Role) -> StoreResult<User> {
        validate_username(username).map_err(CoreError::from)?;

        let user = User::new(username, role);

        if self.db.users().get_by_username(&user.username).await?.is_some() {
            return Err(CoreError::UsernameTaken(user.username).into());
        }

        match self.db.users().insert(&user).await {
            Ok(()) => {}
            // Lost the race between the pre-check and the insert.
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CoreError::UsernameTaken(user.username).into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(id = %user.id, username = %user.username, role = ?user.role, "User registered");

        Ok(user)
    }

    /// Looks up a user by id.
    pub async fn find_user(&self, user_id: &str) -> StoreResult<User> {
        self.require_user(user_id).await
    }

    /// Lists all users, oldest first.
    pub async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.db.users().list().await?)
    }

    /// Removes a user.
    ///
    /// A seller with listed products cannot be removed; the foreign key
    /// from products surfaces as [`DbError::ForeignKeyViolation`].
    pub async fn remove_user(&self, user_id: &str) -> StoreResult<()> {
        let user = self.require_user(user_id).await?;
        self.db.users().delete(&user.id).await?;
        Ok(())
    }

    // =========================================================================
    // Deposits
    // =========================================================================

    /// Adds one coin of the given value to a buyer's deposit.
    ///
    /// ## Errors
    /// - [`CoreError::Forbidden`] unless the user is a buyer
    /// - [`CoreError::UnsupportedDenomination`] for a value outside the
    ///   configured coin set
    pub async fn deposit(&self, user_id: &str, coin_value: i64) -> StoreResult<User> {
        let user = self.require_user(user_id).await?;
        ensure_role(&user, Role::Buyer, "deposit a coin")?;
        self.coins.ensure_supported(coin_value)?;

        self.db.users().credit_deposit(&user.id, coin_value).await?;

        debug!(id = %user.id, coin = coin_value, "Coin deposited");

        self.require_user(&user.id).await
    }

    /// Debits an amount from a buyer's deposit.
    ///
    /// The debit is guarded; when the guard refuses, the current balance
    /// is re-read so the error carries the numbers the caller raced
    /// against.
    pub async fn withdraw(&self, user_id: &str, amount: Money) -> StoreResult<User> {
        if !amount.is_positive() {
            return Err(CoreError::from(ValidationError::MustBePositive {
                field: "amount".to_string(),
            })
            .into());
        }

        let user = self.require_user(user_id).await?;
        ensure_role(&user, Role::Buyer, "withdraw from a deposit")?;

        if !self.db.users().debit_deposit(&user.id, amount.cents()).await? {
            let current = self.require_user(&user.id).await?;
            return Err(CoreError::InsufficientFunds {
                deposit: current.deposit_cents,
                required: amount.cents(),
            }
            .into());
        }

        self.require_user(&user.id).await
    }

    /// Sets a buyer's deposit back to zero and returns the refunded
    /// amount.
    ///
    /// Rendering the refund as coins is the caller's concern, via
    /// [`Store::coins`].
    pub async fn reset_deposit(&self, user_id: &str) -> StoreResult<Money> {
        let user = self.require_user(user_id).await?;
        ensure_role(&user, Role::Buyer, "reset a deposit")?;

        self.db.users().reset_deposit(&user.id).await?;

        info!(id = %user.id, refunded = %user.deposit(), "Deposit reset");

        Ok(user.deposit())
    }

    /// Renders a user's current balance as coin counts.
    pub async fn user_coins(&self, user_id: &str) -> StoreResult<Vec<CoinCount>> {
        let user = self.require_user(user_id).await?;
        Ok(self.coins.decompose(user.deposit())?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Lists a new product for a seller.
    ///
    /// Cost and initial stock must both be positive; a product is
    /// listed because there is something to sell.
    pub async fn create_product(
        &self,
        seller_id: &str,
        name: &str,
        cost_cents: i64,
        amount_available: i64,
    ) -> StoreResult<Product> {
        let seller = self.require_user(seller_id).await?;
        ensure_role(&seller, Role::Seller, "create a product")?;

        validate_product_name(name).map_err(CoreError::from)?;
        validate_cost_cents(cost_cents).map_err(CoreError::from)?;
        if amount_available <= 0 {
            return Err(CoreError::from(ValidationError::MustBePositive {
                field: "amountAvailable".to_string(),
            })
            .into());
        }

        let product = Product::new(&seller.id, name, cost_cents, amount_available);
        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, seller = %seller.id, "Product listed");

        Ok(product)
    }

    /// Looks up a product by id.
    pub async fn find_product(&self, product_id: &str) -> StoreResult<Product> {
        self.require_product(product_id).await
    }

    /// Lists the whole catalog, by name.
    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.db.products().list().await?)
    }

    /// Lists one seller's products, by name.
    pub async fn seller_products(&self, seller_id: &str) -> StoreResult<Vec<Product>> {
        Ok(self.db.products().list_by_seller(seller_id).await?)
    }

    /// Applies a partial update to a product.
    ///
    /// Only the owning seller may update. Stock may be set to zero
    /// (sold out) but never negative.
    pub async fn update_product(
        &self,
        actor_id: &str,
        product_id: &str,
        patch: ProductPatch,
    ) -> StoreResult<Product> {
        let mut product = self.require_product(product_id).await?;
        ensure_product_owner(&product, actor_id, "update")?;

        if patch.is_empty() {
            return Ok(product);
        }

        if let Some(name) = patch.name {
            validate_product_name(&name).map_err(CoreError::from)?;
            product.name = name.trim().to_string();
        }
        if let Some(cost_cents) = patch.cost_cents {
            validate_cost_cents(cost_cents).map_err(CoreError::from)?;
            product.cost_cents = cost_cents;
        }
        if let Some(amount_available) = patch.amount_available {
            validate_amount_available(amount_available).map_err(CoreError::from)?;
            product.amount_available = amount_available;
        }

        self.db.products().save(&product).await?;

        self.require_product(&product.id).await
    }

    /// Removes a product. Only the owning seller may remove it.
    pub async fn remove_product(&self, actor_id: &str, product_id: &str) -> StoreResult<()> {
        let product = self.require_product(product_id).await?;
        ensure_product_owner(&product, actor_id, "delete")?;

        self.db.products().delete(&product.id).await?;
        Ok(())
    }

    // =========================================================================
    // Purchase
    // =========================================================================

    /// Executes a multi-product purchase atomically.
    ///
    /// All validation runs against rows read inside one transaction;
    /// the stock decrements and the deposit debit commit together or
    /// not at all. The receipt carries the total spent, the remaining
    /// balance rendered as change, and post-decrement product
    /// snapshots.
    pub async fn buy(
        &self,
        buyer_id: &str,
        request: &PurchaseRequest,
    ) -> StoreResult<PurchaseReceipt> {
        validate_request(request)?;

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let buyer = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?1"))
            .bind(buyer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| CoreError::UserNotFound(buyer_id.to_string()))?;
        ensure_role(&buyer, Role::Buyer, "buy products")?;

        let mut resolved = Vec::with_capacity(request.products.len());
        for line in &request.products {
            let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(&line.product_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            resolved.push(product);
        }

        let plan = plan_purchase(&buyer, request, &resolved)?;

        debug!(
            buyer = %buyer.id,
            total = %plan.total,
            lines = plan.lines.len(),
            "Committing purchase"
        );

        for line in &plan.lines {
            let applied = self
                .db
                .products()
                .decrement_stock_in(&mut *tx, &line.product_id, line.quantity)
                .await?;

            if !applied {
                error!(product = %line.product_id, "Stock guard failed inside purchase transaction");
                return Err(StoreError::commit_conflict("Product", &line.product_id));
            }
        }

        let applied = self
            .db
            .users()
            .debit_deposit_in(&mut *tx, &buyer.id, plan.total.cents())
            .await?;

        if !applied {
            error!(buyer = %buyer.id, "Deposit guard failed inside purchase transaction");
            return Err(StoreError::commit_conflict("User", &buyer.id));
        }

        let mut purchased = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(&line.product_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;
            purchased.push(product);
        }

        let remaining: i64 = sqlx::query_scalar("SELECT deposit_cents FROM users WHERE id = ?1")
            .bind(&buyer.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;

        // Change is computed before COMMIT: a balance the coin set
        // cannot express rolls the whole purchase back instead of
        // landing a purchase with no receipt.
        let change = match self.coins.decompose(Money::from_cents(remaining)) {
            Ok(change) => change,
            Err(err) => {
                error!(
                    buyer = %buyer.id,
                    remaining,
                    "Remaining balance not expressible as coins; rolling purchase back"
                );
                return Err(err.into());
            }
        };

        tx.commit().await.map_err(DbError::from)?;

        info!(buyer = %buyer.id, total_spent = %plan.total, "Purchase committed");

        Ok(PurchaseReceipt {
            total_spent: plan.total,
            change,
            purchased_products: purchased,
        })
    }

    // =========================================================================
    // Lookup Helpers
    // =========================================================================

    async fn require_user(&self, user_id: &str) -> StoreResult<User> {
        self.db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()).into())
    }

    async fn require_product(&self, product_id: &str) -> StoreResult<Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use vendo_core::PurchaseLine;

    async fn store() -> Store {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Store::new(db, CoinSet::default())
    }

    fn request(lines: &[(&str, i64)]) -> PurchaseRequest {
        PurchaseRequest {
            products: lines
                .iter()
                .map(|(id, amount)| PurchaseLine {
                    product_id: id.to_string(),
                    product_amount: *amount,
                })
                .collect(),
        }
    }

    /// A buyer, a seller and two products: Cola at 15 × 10 in stock,
    /// Water at 30 × 5 in stock.
    async fn seed(store: &Store) -> (User, User, Product, Product) {
        let buyer = store.register_user("alice", Role::Buyer).await.unwrap();
        let seller = store.register_user("bob", Role::Seller).await.unwrap();
        let cola = store.create_product(&seller.id, "Cola", 15, 10).await.unwrap();
        let water = store.create_product(&seller.id, "Water", 30, 5).await.unwrap();
        (buyer, seller, cola, water)
    }

    fn core_err(err: StoreError) -> CoreError {
        match err {
            StoreError::Core(core) => core,
            other => panic!("expected core error, got {other}"),
        }
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_register_lowercases_username() {
        let store = store().await;
        let user = store.register_user("Alice", Role::Buyer).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.deposit_cents, 0);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username_case_insensitively() {
        let store = store().await;
        store.register_user("alice", Role::Buyer).await.unwrap();

        let err = core_err(store.register_user("ALICE", Role::Seller).await.unwrap_err());
        assert!(matches!(err, CoreError::UsernameTaken(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_username() {
        let store = store().await;
        let err = core_err(store.register_user("has space", Role::Buyer).await.unwrap_err());
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_unknown_user() {
        let store = store().await;
        let err = core_err(store.find_user("nope").await.unwrap_err());
        assert!(matches!(err, CoreError::UserNotFound(id) if id == "nope"));
    }

    // -------------------------------------------------------------------------
    // Deposits
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_deposit_accumulates() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;

        store.deposit(&buyer.id, 100).await.unwrap();
        let user = store.deposit(&buyer.id, 100).await.unwrap();
        assert_eq!(user.deposit_cents, 200);
    }

    #[tokio::test]
    async fn test_deposit_rejects_unsupported_coin() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;

        let err = core_err(store.deposit(&buyer.id, 7).await.unwrap_err());
        assert!(matches!(err, CoreError::UnsupportedDenomination { value: 7, .. }));

        // Nothing was credited.
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 0);
    }

    #[tokio::test]
    async fn test_deposit_requires_buyer() {
        let store = store().await;
        let (_, seller, ..) = seed(&store).await;

        let err = core_err(store.deposit(&seller.id, 100).await.unwrap_err());
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_withdraw_and_overdraw() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();

        let user = store.withdraw(&buyer.id, Money::from_cents(30)).await.unwrap();
        assert_eq!(user.deposit_cents, 70);

        let err = core_err(store.withdraw(&buyer.id, Money::from_cents(100)).await.unwrap_err());
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                deposit: 70,
                required: 100,
            }
        ));
    }

    #[tokio::test]
    async fn test_reset_deposit_returns_refund() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;
        store.deposit(&buyer.id, 50).await.unwrap();

        let refund = store.reset_deposit(&buyer.id).await.unwrap();
        assert_eq!(refund.cents(), 50);
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 0);

        // The refund decomposes with the store's own coin set.
        let coins = store.coins().decompose(refund).unwrap();
        assert_eq!(coins, vec![CoinCount { value: 50, count: 1 }]);
    }

    #[tokio::test]
    async fn test_user_coins_renders_balance() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;
        for coin in [100, 20, 5] {
            store.deposit(&buyer.id, coin).await.unwrap();
        }

        let coins = store.user_coins(&buyer.id).await.unwrap();
        assert_eq!(
            coins,
            vec![
                CoinCount { value: 100, count: 1 },
                CoinCount { value: 20, count: 1 },
                CoinCount { value: 5, count: 1 },
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_product_requires_seller() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;

        let err = core_err(store.create_product(&buyer.id, "Juice", 25, 3).await.unwrap_err());
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_create_product_validates_fields() {
        let store = store().await;
        let (_, seller, ..) = seed(&store).await;

        assert!(store.create_product(&seller.id, "", 25, 3).await.is_err());
        assert!(store.create_product(&seller.id, "Juice", 0, 3).await.is_err());
        assert!(store.create_product(&seller.id, "Juice", 25, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_update_product_is_owner_only() {
        let store = store().await;
        let (_, seller, cola, _) = seed(&store).await;
        let other = store.register_user("carol", Role::Seller).await.unwrap();

        let patch = ProductPatch {
            cost_cents: Some(20),
            ..Default::default()
        };

        let err = core_err(
            store
                .update_product(&other.id, &cola.id, patch.clone())
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, CoreError::Forbidden { .. }));

        let updated = store.update_product(&seller.id, &cola.id, patch).await.unwrap();
        assert_eq!(updated.cost_cents, 20);
        assert_eq!(updated.name, "Cola");
    }

    #[tokio::test]
    async fn test_update_product_allows_sold_out() {
        let store = store().await;
        let (_, seller, cola, _) = seed(&store).await;

        let patch = ProductPatch {
            amount_available: Some(0),
            ..Default::default()
        };
        let updated = store.update_product(&seller.id, &cola.id, patch).await.unwrap();
        assert_eq!(updated.amount_available, 0);
    }

    #[tokio::test]
    async fn test_remove_product_is_owner_only() {
        let store = store().await;
        let (buyer, seller, cola, _) = seed(&store).await;

        let err = core_err(store.remove_product(&buyer.id, &cola.id).await.unwrap_err());
        assert!(matches!(err, CoreError::Forbidden { .. }));

        store.remove_product(&seller.id, &cola.id).await.unwrap();
        let err = core_err(store.find_product(&cola.id).await.unwrap_err());
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_seller_products_lists_only_own() {
        let store = store().await;
        let (_, seller, ..) = seed(&store).await;
        let other = store.register_user("carol", Role::Seller).await.unwrap();
        store.create_product(&other.id, "Juice", 25, 3).await.unwrap();

        let names: Vec<String> = store
            .seller_products(&seller.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Cola", "Water"]);
    }

    // -------------------------------------------------------------------------
    // Purchase
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_buy_multi_product() {
        let store = store().await;
        let (buyer, _, cola, water) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();
        store.deposit(&buyer.id, 100).await.unwrap();

        // 2 × 15 + 3 × 30 = 120; change on 80 is one 50, one 20, one 10.
        let receipt = store
            .buy(&buyer.id, &request(&[(&cola.id, 2), (&water.id, 3)]))
            .await
            .unwrap();

        assert_eq!(receipt.total_spent.cents(), 120);
        assert_eq!(
            receipt.change,
            vec![
                CoinCount { value: 50, count: 1 },
                CoinCount { value: 20, count: 1 },
                CoinCount { value: 10, count: 1 },
            ]
        );

        // Receipt snapshots are post-decrement.
        assert_eq!(receipt.purchased_products[0].amount_available, 8);
        assert_eq!(receipt.purchased_products[1].amount_available, 2);

        // And the stored rows agree.
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 80);
        assert_eq!(store.find_product(&cola.id).await.unwrap().amount_available, 8);
        assert_eq!(store.find_product(&water.id).await.unwrap().amount_available, 2);
    }

    #[tokio::test]
    async fn test_buy_exact_funds_leaves_no_change() {
        let store = store().await;
        let (buyer, _, cola, _) = seed(&store).await;
        store.deposit(&buyer.id, 50).await.unwrap();
        store.deposit(&buyer.id, 10).await.unwrap();

        let receipt = store.buy(&buyer.id, &request(&[(&cola.id, 4)])).await.unwrap();
        assert_eq!(receipt.total_spent.cents(), 60);
        assert!(receipt.change.is_empty());
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 0);
    }

    #[tokio::test]
    async fn test_buy_insufficient_stock_changes_nothing() {
        let store = store().await;
        let (buyer, _, cola, water) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();
        store.deposit(&buyer.id, 100).await.unwrap();

        // Water has 5 in stock; ask for 6 alongside a valid cola line.
        let err = core_err(
            store
                .buy(&buyer.id, &request(&[(&cola.id, 2), (&water.id, 6)]))
                .await
                .unwrap_err(),
        );
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));

        // All-or-nothing: the valid cola line was not applied either.
        assert_eq!(store.find_product(&cola.id).await.unwrap().amount_available, 10);
        assert_eq!(store.find_product(&water.id).await.unwrap().amount_available, 5);
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 200);
    }

    #[tokio::test]
    async fn test_buy_insufficient_funds_changes_nothing() {
        let store = store().await;
        let (buyer, _, _, water) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();

        let err = core_err(store.buy(&buyer.id, &request(&[(&water.id, 4)])).await.unwrap_err());
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                deposit: 100,
                required: 120,
            }
        ));

        assert_eq!(store.find_product(&water.id).await.unwrap().amount_available, 5);
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 100);
    }

    #[tokio::test]
    async fn test_buy_rolls_back_when_change_is_unrepresentable() {
        let store = store().await;
        let (buyer, seller, ..) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();

        // Cost 7 is a listable price, but 100 - 7 = 93 has no coin
        // decomposition. The purchase must not land half-way.
        let gum = store.create_product(&seller.id, "Gum", 7, 10).await.unwrap();

        let err = core_err(store.buy(&buyer.id, &request(&[(&gum.id, 1)])).await.unwrap_err());
        assert!(matches!(
            err,
            CoreError::UnrepresentableAmount {
                amount: 93,
                remainder: 3,
                ..
            }
        ));

        // Rolled back: deposit and stock are untouched.
        assert_eq!(store.find_user(&buyer.id).await.unwrap().deposit_cents, 100);
        assert_eq!(store.find_product(&gum.id).await.unwrap().amount_available, 10);
    }

    #[tokio::test]
    async fn test_buy_rejects_duplicate_lines() {
        let store = store().await;
        let (buyer, _, cola, _) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();

        let err = core_err(
            store
                .buy(&buyer.id, &request(&[(&cola.id, 1), (&cola.id, 1)]))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, CoreError::DuplicateProduct(_)));
    }

    #[tokio::test]
    async fn test_buy_rejects_unknown_product() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;
        store.deposit(&buyer.id, 100).await.unwrap();

        let err = core_err(store.buy(&buyer.id, &request(&[("ghost", 1)])).await.unwrap_err());
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_buy_requires_buyer() {
        let store = store().await;
        let (_, seller, cola, _) = seed(&store).await;

        let err = core_err(store.buy(&seller.id, &request(&[(&cola.id, 1)])).await.unwrap_err());
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_buy_rejects_empty_request() {
        let store = store().await;
        let (buyer, ..) = seed(&store).await;

        let err = core_err(store.buy(&buyer.id, &request(&[])).await.unwrap_err());
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
