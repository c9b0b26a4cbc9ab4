use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{dto::PublicUser, repo_types::User};
use crate::news::repo_types::NewsItem;
use crate::state::AppState;

/// Number of items shown in the feed.
pub const FEED_SIZE: i64 = 10;

/// Everything a page needs, handed to the presentation layer as JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ViewModel {
    pub current_user: Option<PublicUser>,
    pub user_count: i64,
    pub items: Vec<NewsItem>,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
    pub login_error: Option<String>,
}

impl ViewModel {
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error_message = Some(msg.into());
        self
    }

    pub fn with_success(mut self, msg: impl Into<String>) -> Self {
        self.success_message = Some(msg.into());
        self
    }

    pub fn with_login_error(mut self, msg: impl Into<String>) -> Self {
        self.login_error = Some(msg.into());
        self
    }
}

impl IntoResponse for ViewModel {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Current user, user count and feed. Read failures degrade to empty values.
pub async fn build_view_model(state: &AppState, user: Option<&User>) -> ViewModel {
    let items = state.news.recent(FEED_SIZE).await;
    let user_count = match state.users.count().await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "user count unavailable");
            0
        }
    };
    ViewModel {
        current_user: user.map(PublicUser::from),
        user_count,
        items,
        ..Default::default()
    }
}
