//! Account models for storage rows and API payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account row as stored
///
/// `favorites` is an ordered set: the database guards uniqueness on insert
/// and the array order is the insertion order. This struct is never
/// serialized to the outside — responses go through [`UserResponse`] so the
/// password hash cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub birthday: Option<NaiveDate>,
    pub favorites: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birthday: Option<NaiveDate>,
}

/// Profile update payload
///
/// The username is the account's immutable identifier and cannot change.
/// A missing password leaves the stored hash untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Externally visible account representation
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
    pub favorites: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        UserResponse {
            username: account.username,
            email: account.email,
            birthday: account.birthday,
            favorites: account.favorites,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            username: "alice12".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            birthday: None,
            favorites: vec![Uuid::new_v4(), Uuid::new_v4()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_never_contains_password_hash() {
        let response = UserResponse::from(account());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_response_preserves_favorites_order() {
        let account = account();
        let favorites = account.favorites.clone();
        let response = UserResponse::from(account);
        assert_eq!(response.favorites, favorites);
    }
}
