use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::User;

/// Durable mapping from email to user record, backed by sqlite.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Open the database (creating the file if missing), initialize the
    /// schema, and return a ready store.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a new user. The UNIQUE email column makes the uniqueness
    /// check and the insert a single atomic statement; a constraint
    /// violation surfaces as `EmailInUse`.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now();

        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailInUse;
                }
            }
            AppError::from(e)
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/users.sqlite", dir.path().display());
        let store = UserStore::connect(&url).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_and_find_back() {
        let (_dir, store) = temp_store().await;

        let created = store
            .create("Ada", "ada@example.com", "$argon2id$fake")
            .await
            .unwrap();
        assert_eq!(created.name, "Ada");
        assert!(!created.id.is_empty());

        let by_email = store
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.password_hash, "$argon2id$fake");

        let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_email_in_use() {
        let (_dir, store) = temp_store().await;

        store.create("Ada", "ada@example.com", "h1").await.unwrap();
        let err = store
            .create("Grace", "ada@example.com", "h2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailInUse));
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let (_dir, store) = temp_store().await;

        assert!(store
            .find_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_id("no-such-id").await.unwrap().is_none());
    }
}
