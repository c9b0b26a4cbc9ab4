use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::auth::repo_types::User;
use crate::error::{is_unique_violation, AppError, AppResult};

/// Persistence for user records. Usernames are unique and compared case-sensitively.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
    /// Single conditional write; the `UNIQUE` constraint decides concurrent races.
    async fn rename_user(&self, id: i64, new_username: &str) -> AppResult<()>;
    async fn count(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct SqliteCredentialStore {
    db: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateUsername(username.to_string())
            } else {
                AppError::Persistence(e)
            }
        })?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, username, password_hash FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn rename_user(&self, id: i64, new_username: &str) -> AppResult<()> {
        let result = sqlx::query(r#"UPDATE users SET username = $1 WHERE id = $2"#)
            .bind(new_username)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateUsername(new_username.to_string())
                } else {
                    AppError::Persistence(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user"));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let n = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users"#)
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> SqliteCredentialStore {
        SqliteCredentialStore::new(db::memory().await)
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let store = store().await;
        let alice = store.create_user("alice", "hash-a").await.unwrap();
        assert_eq!(alice.username, "alice");

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name, alice);
        let by_id = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(by_id, alice);
        assert!(store.find_by_username("bob").await.unwrap().is_none());
        assert!(store.find_by_id(alice.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_and_first_record_kept() {
        let store = store().await;
        let first = store.create_user("alice", "hash-a").await.unwrap();

        let err = store.create_user("alice", "hash-b").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername(ref n) if n == "alice"));

        let kept = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(kept, first);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = store().await;
        store.create_user("alice", "h").await.unwrap();
        store.create_user("Alice", "h").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn rename_to_taken_name_fails_and_keeps_name() {
        let store = store().await;
        let alice = store.create_user("alice", "h").await.unwrap();
        store.create_user("bob", "h").await.unwrap();

        let err = store.rename_user(alice.id, "bob").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername(_)));
        let still = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(still.username, "alice");
    }

    #[tokio::test]
    async fn rename_updates_username() {
        let store = store().await;
        let alice = store.create_user("alice", "h").await.unwrap();
        store.rename_user(alice.id, "alicia").await.unwrap();
        assert!(store.find_by_username("alice").await.unwrap().is_none());
        let renamed = store.find_by_username("alicia").await.unwrap().unwrap();
        assert_eq!(renamed.id, alice.id);

        // Renaming to the current name is not a conflict.
        store.rename_user(alice.id, "alicia").await.unwrap();
    }

    #[tokio::test]
    async fn rename_unknown_user_is_not_found() {
        let store = store().await;
        let err = store.rename_user(42, "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("user")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_renames_to_same_name_only_one_wins() {
        let (db, _dir) = db::temp_file().await;
        let store = SqliteCredentialStore::new(db);
        let a = store.create_user("a", "h").await.unwrap();
        let b = store.create_user("b", "h").await.unwrap();

        let tasks: Vec<_> = [a.id, b.id]
            .into_iter()
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move { store.rename_user(id, "taken").await })
            })
            .collect();
        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.expect("rename task"));
        }

        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "{results:?}");
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::DuplicateUsername(n)) if n == "taken")));

        let taken = store.find_by_username("taken").await.unwrap().unwrap();
        assert!(taken.id == a.id || taken.id == b.id);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
