use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsForm, EditProfileForm},
        extractors::{session_cookie, session_cookie_removal, Identity},
        services::{authenticate, check_username_length, register as register_user},
    },
    error::AppError,
    state::AppState,
    view::{build_view_model, ViewModel},
};

const LOGIN_FAILED: &str = "Login failed: incorrect username or password.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/cadastrar", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/perfil", get(view_profile))
        .route("/perfil/editar", post(edit_profile))
}

#[instrument(skip(state, identity, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    identity: Identity,
    Form(form): Form<CredentialsForm>,
) -> ViewModel {
    let result = register_user(state.users.as_ref(), &form.username, &form.password).await;
    let view = build_view_model(&state, identity.user.as_ref()).await;

    match result {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            view.with_success("Account created! You can now log in.")
        }
        Err(AppError::DuplicateUsername(name)) => {
            warn!(username = %name, "username already registered");
            view.with_error(format!("Error: user \"{}\" is already registered.", name))
        }
        Err(AppError::Validation(msg)) => view.with_error(msg),
        Err(AppError::Persistence(e)) => {
            error!(error = %e, "create user failed");
            view.with_error(format!("Database error: {}", e))
        }
        Err(e) => {
            error!(error = %e, "registration failed");
            view.with_error(format!("Registration failed: {}", e))
        }
    }
}

#[instrument(skip(state, identity, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let user = match authenticate(state.users.as_ref(), &form.username, &form.password).await {
        Ok(u) => u,
        Err(e) => {
            if !matches!(e, AppError::Authentication) {
                error!(error = %e, "login lookup failed");
            }
            return build_view_model(&state, identity.user.as_ref())
                .await
                .with_login_error(LOGIN_FAILED)
                .into_response();
        }
    };

    let token = match state.sessions.start(user.id).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, user_id = user.id, "session start failed");
            return build_view_model(&state, identity.user.as_ref())
                .await
                .with_login_error(LOGIN_FAILED)
                .into_response();
        }
    };

    info!(user_id = user.id, username = %user.username, "user logged in");
    let cookie = session_cookie(
        &state.config.session,
        token.as_str().to_owned(),
        state.sessions.ttl(),
    );
    (jar.add(cookie), Redirect::to("/perfil")).into_response()
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    identity: Identity,
    jar: CookieJar,
) -> Response {
    if let Some(token) = identity.token.as_deref() {
        state.sessions.end(token).await;
    }
    if let Some(user) = &identity.user {
        info!(user_id = user.id, "user logged out");
    }
    let jar = jar.remove(session_cookie_removal(&state.config.session));
    (jar, Redirect::to("/")).into_response()
}

#[instrument(skip_all)]
pub async fn view_profile(State(state): State<AppState>, identity: Identity) -> Response {
    let Some(user) = identity.user else {
        return Redirect::to("/").into_response();
    };
    build_view_model(&state, Some(&user)).await.into_response()
}

#[instrument(skip(state, identity, form), fields(new_username = %form.new_username))]
pub async fn edit_profile(
    State(state): State<AppState>,
    identity: Identity,
    Form(form): Form<EditProfileForm>,
) -> Response {
    let Some(user) = identity.user else {
        return Redirect::to("/").into_response();
    };

    let new_username = form.new_username.trim();
    if new_username.is_empty() {
        return Redirect::to("/perfil").into_response();
    }
    if let Err(e) = check_username_length(new_username) {
        warn!(error = %e, user_id = user.id, "rename rejected");
        return Redirect::to("/perfil").into_response();
    }

    match state.users.rename_user(user.id, new_username).await {
        Ok(()) => {
            info!(user_id = user.id, from = %user.username, to = %new_username, "user renamed");
            Redirect::to("/perfil").into_response()
        }
        Err(AppError::DuplicateUsername(_)) => {
            warn!(user_id = user.id, "rename to a taken username");
            (StatusCode::CONFLICT, "Error: username already exists.").into_response()
        }
        Err(AppError::NotFound(_)) => Redirect::to("/").into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, "rename failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error updating profile: {}", e),
            )
                .into_response()
        }
    }
}
