use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::auth::password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
use crate::auth::repo::CredentialStore;
use crate::auth::repo_types::{User, USERNAME_MAX_CHARS};
use crate::error::{AppError, AppResult};

/// Rejects usernames longer than the column allows. Callers handle blanks themselves.
pub fn check_username_length(username: &str) -> AppResult<()> {
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Username must be at most {} characters.",
            USERNAME_MAX_CHARS
        )));
    }
    Ok(())
}

/// Creates an account. Does not start a session.
pub async fn register(
    users: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let username = username.trim();
    if username.is_empty() || password.trim().is_empty() {
        return Err(AppError::Validation("Please fill in all fields.".into()));
    }
    check_username_length(username)?;

    if users.find_by_username(username).await?.is_some() {
        return Err(AppError::DuplicateUsername(username.to_string()));
    }

    let hash = hash_password_blocking(password.to_string()).await?;
    // A concurrent registration can still win here; the store reports it as a duplicate.
    users.create_user(username, &hash).await
}

/// Checks credentials. Unknown user and wrong password fail the same way.
pub async fn authenticate(
    users: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let username = username.trim();
    let Some(user) = users.find_by_username(username).await? else {
        // Spend the same verification cost as for a real account.
        let password = password.to_string();
        let _ = tokio::task::spawn_blocking(move || verify_password(&password, dummy_hash())).await;
        debug!("login for unknown username");
        return Err(AppError::Authentication);
    };

    if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AppError::Authentication);
    }
    Ok(user)
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}
