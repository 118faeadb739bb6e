//! # User Repository
//!
//! Database operations for users and their deposit balances.
//!
//! ## Deposit Mutation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read-modify-write with an absolute value                 │
//! │     read deposit (80) → compute 80 - 50 → UPDATE ... SET 30        │
//! │     (a concurrent writer between the read and the write is lost)   │
//! │                                                                     │
//! │  ✅ CORRECT: relative update with the precondition inside           │
//! │     UPDATE users SET deposit_cents = deposit_cents - 50            │
//! │     WHERE id = ? AND deposit_cents >= 50                           │
//! │                                                                     │
//! │  Zero rows affected ⇒ the precondition no longer holds; the        │
//! │  caller re-reads and reports the precise domain error.             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vendo_core::User;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

pub(crate) const SELECT_USER: &str =
    "SELECT id, username, role, deposit_cents, created_at, updated_at FROM users";

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by id.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - user found
    /// * `Ok(None)` - user not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by username.
    ///
    /// Usernames are stored lowercase, so the lookup lowercases its input
    /// and matching is case-insensitive.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let username = username.to_lowercase();

        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE username = ?1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists all users, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT_USER} ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already exists
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, username, role, deposit_cents, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(user.role)
        .bind(user.deposit_cents)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Saves an existing user (full-row update except identity).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - user doesn't exist
    pub async fn save(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Updating user");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET username = ?2, role = ?3, deposit_cents = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(user.role)
        .bind(user.deposit_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }

        Ok(())
    }

    /// Deletes a user.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - user doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - seller still has products
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Adds a coin value to a user's deposit (relative update).
    ///
    /// Denomination validation happens before this call; the repository
    /// only applies the credit.
    pub async fn credit_deposit(&self, id: &str, amount_cents: i64) -> DbResult<()> {
        debug!(id = %id, amount = %amount_cents, "Crediting deposit");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET deposit_cents = deposit_cents + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(amount_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Debits a user's deposit, guarded against overdraw.
    ///
    /// ## Returns
    /// * `Ok(true)` - debit applied
    /// * `Ok(false)` - user missing or deposit below the amount; the
    ///   caller re-reads to tell the two apart
    pub async fn debit_deposit(&self, id: &str, amount_cents: i64) -> DbResult<bool> {
        self.debit_deposit_in(&self.pool, id, amount_cents).await
    }

    /// [`Self::debit_deposit`] against a caller-supplied executor, so
    /// the purchase commit can run the same statement inside its
    /// transaction.
    pub async fn debit_deposit_in<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, amount = %amount_cents, "Debiting deposit");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET deposit_cents = deposit_cents - ?2, updated_at = ?3 \
             WHERE id = ?1 AND deposit_cents >= ?2",
        )
        .bind(id)
        .bind(amount_cents)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets a user's deposit back to zero.
    pub async fn reset_deposit(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Resetting deposit");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE users SET deposit_cents = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use vendo_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn user(username: &str, role: Role) -> User {
        User::new(username, role)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.users();

        let alice = user("alice", Role::Buyer);
        repo.insert(&alice).await.unwrap();

        let loaded = repo.get_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.role, Role::Buyer);
        assert_eq!(loaded.deposit_cents, 0);
    }

    #[tokio::test]
    async fn test_get_by_username_is_case_insensitive() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert(&user("alice", Role::Buyer)).await.unwrap();

        assert!(repo.get_by_username("ALICE").await.unwrap().is_some());
        assert!(repo.get_by_username("alice").await.unwrap().is_some());
        assert!(repo.get_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert(&user("alice", Role::Buyer)).await.unwrap();
        let err = repo.insert(&user("alice", Role::Seller)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let db = test_db().await;
        let repo = db.users();

        let alice = user("alice", Role::Buyer);
        repo.insert(&alice).await.unwrap();

        repo.credit_deposit(&alice.id, 100).await.unwrap();
        repo.credit_deposit(&alice.id, 50).await.unwrap();

        assert!(repo.debit_deposit(&alice.id, 120).await.unwrap());
        let loaded = repo.get_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.deposit_cents, 30);

        // Guard refuses to overdraw.
        assert!(!repo.debit_deposit(&alice.id, 31).await.unwrap());
        let loaded = repo.get_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.deposit_cents, 30);
    }

    #[tokio::test]
    async fn test_debit_deposit_in_rolled_back_transaction() {
        let db = test_db().await;
        let repo = db.users();

        let alice = user("alice", Role::Buyer);
        repo.insert(&alice).await.unwrap();
        repo.credit_deposit(&alice.id, 100).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert!(repo.debit_deposit_in(&mut *tx, &alice.id, 40).await.unwrap());
        tx.rollback().await.unwrap();

        let loaded = repo.get_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.deposit_cents, 100);
    }

    #[tokio::test]
    async fn test_reset_deposit() {
        let db = test_db().await;
        let repo = db.users();

        let alice = user("alice", Role::Buyer);
        repo.insert(&alice).await.unwrap();
        repo.credit_deposit(&alice.id, 100).await.unwrap();

        repo.reset_deposit(&alice.id).await.unwrap();
        let loaded = repo.get_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.deposit_cents, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = test_db().await;
        let err = db.users().delete("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
