//! Account repository for database operations
//!
//! Every mutation here is a single SQL statement, so concurrent requests
//! against the same account are serialized by the database row lock and
//! there is never a partially applied update to roll back.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Account, NewUser, UpdateUser},
    password,
};

/// Account repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new account
    ///
    /// The plaintext password is hashed here, at the persistence boundary,
    /// so no code path can store it raw. A duplicate username surfaces as
    /// `Conflict` via the unique key, not a racy find-then-create.
    pub async fn create(&self, new_user: &NewUser) -> ApiResult<Account> {
        info!("Creating new account: {}", new_user.username);

        let password_hash = password::hash_password(&new_user.password)?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (username, email, password_hash, birthday)
            VALUES ($1, $2, $3, $4)
            RETURNING username, email, password_hash, birthday, favorites, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(new_user.birthday)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    /// Find an account by username
    pub async fn find_by_username(&self, username: &str) -> ApiResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT username, email, password_hash, birthday, favorites, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Update an account's profile fields
    ///
    /// Only provided fields change. A new password is hashed before it is
    /// written; an absent password leaves the stored hash untouched.
    pub async fn update(&self, username: &str, update: &UpdateUser) -> ApiResult<Account> {
        info!("Updating account: {}", username);

        let password_hash = match &update.password {
            Some(password) => Some(password::hash_password(password)?),
            None => None,
        };

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                birthday = COALESCE($4, birthday),
                updated_at = now()
            WHERE username = $1
            RETURNING username, email, password_hash, birthday, favorites, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(&update.email)
        .bind(&password_hash)
        .bind(update.birthday)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} was not found", username)))?;

        Ok(account)
    }

    /// Delete an account
    ///
    /// Returns whether an account was actually removed. The row is keyed by
    /// username, so deletion also removes the account from the only index
    /// that can resolve it.
    pub async fn delete(&self, username: &str) -> ApiResult<bool> {
        info!("Deleting account: {}", username);

        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a movie reference to an account's favorites
    ///
    /// Idempotent set-insert in one atomic statement: an already-present
    /// reference leaves the array unchanged and still succeeds.
    pub async fn add_favorite(&self, username: &str, movie_id: Uuid) -> ApiResult<Account> {
        info!("Adding favorite {} for account {}", movie_id, username);

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users
            SET favorites = CASE
                    WHEN $2 = ANY(favorites) THEN favorites
                    ELSE array_append(favorites, $2)
                END,
                updated_at = now()
            WHERE username = $1
            RETURNING username, email, password_hash, birthday, favorites, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} was not found", username)))?;

        Ok(account)
    }

    /// Remove a movie reference from an account's favorites
    ///
    /// Idempotent: removing an absent reference is a no-op success.
    pub async fn remove_favorite(&self, username: &str, movie_id: Uuid) -> ApiResult<Account> {
        info!("Removing favorite {} for account {}", movie_id, username);

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users
            SET favorites = array_remove(favorites, $2),
                updated_at = now()
            WHERE username = $1
            RETURNING username, email, password_hash, birthday, favorites, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} was not found", username)))?;

        Ok(account)
    }

    /// List an account's favorites in insertion order
    pub async fn list_favorites(&self, username: &str) -> ApiResult<Vec<Uuid>> {
        let account = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{} was not found", username)))?;

        Ok(account.favorites)
    }
}
