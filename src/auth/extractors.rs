use std::convert::Infallible;
use std::time::Duration;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, warn};

use crate::auth::repo_types::User;
use crate::config::SessionConfig;
use crate::state::AppState;

/// Who is making the request, resolved once from the session cookie.
///
/// `user` is `None` for anonymous visitors and for sessions that are ended,
/// expired, forged, or point at a user that no longer exists.
#[derive(Debug, Default)]
pub struct Identity {
    pub token: Option<String>,
    pub user: Option<User>,
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = session_token(&jar, &state.config.session.cookie_name) else {
            return Ok(Identity::default());
        };

        let Some(user_id) = state.sessions.current_user_id(&token).await else {
            return Ok(Identity {
                token: Some(token),
                user: None,
            });
        };

        let user = match state.users.find_by_id(user_id).await {
            Ok(Some(u)) => Some(u),
            Ok(None) => {
                warn!(user_id, "session refers to a missing user; treating as anonymous");
                None
            }
            Err(e) => {
                error!(error = %e, user_id, "user lookup failed; treating as anonymous");
                None
            }
        };

        Ok(Identity {
            token: Some(token),
            user,
        })
    }
}

/// Session token from cookie `name`, with RFC 6265 quotes stripped. Empty values count as absent.
pub fn session_token(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value_trimmed().to_string())
        .filter(|v| !v.is_empty())
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(cfg: &SessionConfig, token: String, max_age: Duration) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
    Cookie::build((cfg.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.cookie_secure)
        .max_age(max_age)
        .build()
}

/// Cookie matching the session cookie's name and path, for `CookieJar::remove`.
pub fn session_cookie_removal(cfg: &SessionConfig) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar(cookies: &[&'static str]) -> CookieJar {
        let mut headers = HeaderMap::new();
        for c in cookies {
            headers.append(header::COOKIE, HeaderValue::from_static(*c));
        }
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn reads_named_cookie_among_others() {
        let jar = jar(&["theme=dark; session=abc.def.ghi; lang=pt"]);
        assert_eq!(session_token(&jar, "session").as_deref(), Some("abc.def.ghi"));
        assert_eq!(session_token(&jar, "missing"), None);
    }

    #[test]
    fn quoted_cookie_value_is_unquoted() {
        let jar = jar(&["session=\"abc.def.ghi\""]);
        assert_eq!(session_token(&jar, "session").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn empty_cookie_is_absent() {
        assert_eq!(session_token(&jar(&["session="]), "session"), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let mut cfg = AppConfig::for_tests().session;
        let cookie = session_cookie(&cfg, "tok".into(), Duration::from_secs(300));
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(300)));
        assert_ne!(cookie.secure(), Some(true));

        cfg.cookie_secure = true;
        let cookie = session_cookie(&cfg, "tok".into(), Duration::from_secs(300));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.to_string().contains("Secure"));
    }
}
