//! Account repository.
//!
//! Handles account creation and password authentication for token issuance.

use super::DbError;
use crate::security::password::{hash_password, verify_password};
use sqlx::SqlitePool;
use std::sync::OnceLock;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
    pub created_at: i64,
}

type AccountRow = (i64, String, Option<String>, Option<String>, bool, i64);

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        let (id, username, full_name, email, disabled, created_at) = row;
        Self {
            id,
            username,
            full_name,
            email,
            disabled,
            created_at,
        }
    }
}

/// Repository for account operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account with an Argon2-hashed password.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Account, DbError> {
        let password_hash = hash_password(password).map_err(|_| DbError::InvalidPassword)?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (username, password_hash, full_name, email, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(full_name)
        .bind(email)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::AccountExists(username.to_string());
            }
            DbError::from(e)
        })?;

        Ok(Account {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            full_name: full_name.map(String::from),
            email: email.map(String::from),
            disabled: false,
            created_at: now,
        })
    }

    /// Find account by username (exact match).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, full_name, email, disabled, created_at
            FROM accounts
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    /// Verify a password and return the account if it is valid and enabled.
    ///
    /// Unknown usernames still pay for one Argon2 verification so response
    /// time does not reveal whether the account exists.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String, Option<String>, Option<String>, bool, i64)>(
            r#"
            SELECT id, username, password_hash, full_name, email, disabled, created_at
            FROM accounts
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, username, password_hash, full_name, email, disabled, created_at)) = row
        else {
            dummy_password_verify(password);
            return Err(DbError::AccountNotFound(username.to_string()));
        };

        if !verify_password(password, &password_hash) {
            return Err(DbError::InvalidPassword);
        }
        if disabled {
            return Err(DbError::AccountDisabled(username));
        }

        Ok(Account {
            id,
            username,
            full_name,
            email,
            disabled,
            created_at,
        })
    }

    /// Enable or disable an account. Disabled accounts cannot log in or connect.
    pub async fn set_disabled(&self, username: &str, disabled: bool) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE accounts SET disabled = ? WHERE username = ?")
            .bind(disabled)
            .bind(username)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::AccountNotFound(username.to_string()));
        }
        Ok(())
    }
}

/// Burn roughly one verification's worth of CPU for a missing account.
fn dummy_password_verify(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    if let Some(hash) = DUMMY_HASH.get_or_init(|| hash_password("timing-oracle-dummy").ok()) {
        let _ = verify_password(password, hash);
    }
}
