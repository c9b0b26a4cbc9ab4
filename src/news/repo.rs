use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::news::repo_types::{NewsItem, TITLE_MAX_CHARS};

#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn publish(&self, title: &str, content: &str) -> AppResult<NewsItem>;
    /// Newest first, at most `limit` items. Never fails: an unavailable store yields an empty feed.
    async fn recent(&self, limit: i64) -> Vec<NewsItem>;
}

#[derive(Clone)]
pub struct SqliteNewsStore {
    db: SqlitePool,
}

impl SqliteNewsStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn try_recent(&self, limit: i64) -> sqlx::Result<Vec<NewsItem>> {
        // julianday() compares instants; the RFC 3339 text does not sort lexically
        sqlx::query_as::<_, NewsItem>(
            r#"
            SELECT id, title, content, created_at
            FROM news_items
            ORDER BY julianday(created_at) DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
    }
}

#[async_trait]
impl NewsStore for SqliteNewsStore {
    async fn publish(&self, title: &str, content: &str) -> AppResult<NewsItem> {
        let title = title.trim();
        if title.is_empty() || content.trim().is_empty() {
            return Err(AppError::Validation("Please fill in title and content.".into()));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "Title must be at most {} characters.",
                TITLE_MAX_CHARS
            )));
        }

        let mut tx = self.db.begin().await?;
        let item = sqlx::query_as::<_, NewsItem>(
            r#"
            INSERT INTO news_items (title, content, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, created_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn recent(&self, limit: i64) -> Vec<NewsItem> {
        match self.try_recent(limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "news feed unavailable; serving empty feed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use time::macros::datetime;

    #[tokio::test]
    async fn publish_assigns_id_and_timestamp() {
        let store = SqliteNewsStore::new(db::memory().await);
        let before = OffsetDateTime::now_utc();
        let item = store.publish("Hello", "World").await.unwrap();
        assert_eq!(item.title, "Hello");
        assert_eq!(item.content, "World");
        assert!(item.created_at >= before);
        assert_eq!(store.recent(10).await, vec![item]);
    }

    #[tokio::test]
    async fn publish_rejects_empty_fields() {
        let store = SqliteNewsStore::new(db::memory().await);
        assert!(matches!(
            store.publish("", "body").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.publish("title", "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(store.recent(10).await.is_empty());
    }

    #[tokio::test]
    async fn publish_rejects_long_title() {
        let store = SqliteNewsStore::new(db::memory().await);
        let title = "t".repeat(TITLE_MAX_CHARS + 1);
        assert!(matches!(
            store.publish(&title, "body").await,
            Err(AppError::Validation(_))
        ));
        let title = "é".repeat(TITLE_MAX_CHARS);
        store.publish(&title, "body").await.unwrap();
    }

    #[tokio::test]
    async fn recent_returns_newest_ten_of_fifteen() {
        let store = SqliteNewsStore::new(db::memory().await);
        for i in 0..15 {
            store.publish(&format!("item {}", i), "c").await.unwrap();
        }
        let titles: Vec<String> = store.recent(10).await.into_iter().map(|n| n.title).collect();
        let expected: Vec<String> = (5..15).rev().map(|i| format!("item {}", i)).collect();
        assert_eq!(titles, expected);
    }

    #[tokio::test]
    async fn recent_orders_by_created_at_then_insertion() {
        let db = db::memory().await;
        let rows = [
            ("late", datetime!(2024-05-01 12:00:00.5 UTC)),
            ("early", datetime!(2024-05-01 12:00:00 UTC)),
            ("tie-first", datetime!(2024-05-01 12:00:00.25 UTC)),
            ("tie-second", datetime!(2024-05-01 12:00:00.25 UTC)),
        ];
        for (title, at) in rows {
            sqlx::query("INSERT INTO news_items (title, content, created_at) VALUES ($1, 'c', $2)")
                .bind(title)
                .bind(at)
                .execute(&db)
                .await
                .unwrap();
        }
        let store = SqliteNewsStore::new(db);
        let titles: Vec<String> = store.recent(10).await.into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["late", "tie-second", "tie-first", "early"]);
    }

    #[tokio::test]
    async fn recent_on_closed_pool_is_empty() {
        let db = db::memory().await;
        let store = SqliteNewsStore::new(db.clone());
        store.publish("t", "c").await.unwrap();
        db.close().await;
        assert!(store.recent(10).await.is_empty());
    }
}
