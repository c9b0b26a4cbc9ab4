use crate::auth::repo_types::User;
use crate::error::{AppError, AppResult};
use crate::news::repo::NewsStore;
use crate::news::repo_types::NewsItem;

/// Publishes on behalf of `author`. Only the admin account may publish;
/// input validation is left to the store.
pub async fn publish_as(
    news: &dyn NewsStore,
    author: Option<&User>,
    title: &str,
    content: &str,
) -> AppResult<NewsItem> {
    if !author.is_some_and(User::is_admin) {
        return Err(AppError::Authorization);
    }
    news.publish(title, content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::news::repo::SqliteNewsStore;

    fn user(name: &str) -> User {
        User {
            id: 1,
            username: name.into(),
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn only_admin_can_publish() {
        let news = SqliteNewsStore::new(db::memory().await);

        for author in [None, Some(user("alice")), Some(user("Admin"))] {
            let err = publish_as(&news, author.as_ref(), "T", "C").await.unwrap_err();
            assert!(matches!(err, AppError::Authorization));
        }
        assert!(news.recent(10).await.is_empty());

        let item = publish_as(&news, Some(&user("admin")), "T", "C").await.unwrap();
        assert_eq!(news.recent(10).await.first(), Some(&item));
    }

    #[tokio::test]
    async fn authorization_is_checked_before_validation() {
        let news = SqliteNewsStore::new(db::memory().await);
        let err = publish_as(&news, Some(&user("alice")), "", "").await.unwrap_err();
        assert!(matches!(err, AppError::Authorization));
        let err = publish_as(&news, Some(&user("admin")), "", "C").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Please fill in title and content."));
        let long = "x".repeat(201);
        let err = publish_as(&news, Some(&user("admin")), &long, "C").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Title must be at most 200 characters."));
        assert!(news.recent(10).await.is_empty());
    }
}
