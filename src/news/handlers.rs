use axum::{
    extract::State,
    routing::{get, post},
    Form, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::extractors::Identity,
    error::AppError,
    news::{dto::PublishForm, services::publish_as},
    state::AppState,
    view::{build_view_model, ViewModel},
};

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/criar_noticia", post(publish_news))
}

#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, identity: Identity) -> ViewModel {
    build_view_model(&state, identity.user.as_ref()).await
}

#[instrument(skip_all)]
pub async fn publish_news(
    State(state): State<AppState>,
    identity: Identity,
    Form(form): Form<PublishForm>,
) -> ViewModel {
    let result = publish_as(
        state.news.as_ref(),
        identity.user.as_ref(),
        &form.title,
        &form.content,
    )
    .await;
    let view = build_view_model(&state, identity.user.as_ref()).await;

    match result {
        Ok(item) => {
            info!(news_id = item.id, title = %item.title, "news published");
            view.with_success("News published!")
        }
        Err(AppError::Authorization) => {
            warn!(
                username = identity.user.as_ref().map(|u| u.username.as_str()),
                "non-admin tried to publish news"
            );
            view.with_error("Only administrators can publish news.")
        }
        Err(AppError::Validation(msg)) => view.with_error(msg),
        Err(AppError::Persistence(e)) => {
            error!(error = %e, "publish news failed");
            view.with_error(format!("Error publishing news: {}", e))
        }
        Err(e) => {
            error!(error = %e, "publish news failed");
            view.with_error(format!("Error publishing news: {}", e))
        }
    }
}
