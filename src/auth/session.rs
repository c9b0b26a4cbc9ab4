use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::dto::Claims;
use crate::config::{SessionConfig, MAX_SESSION_TTL_MINUTES};

/// Opaque value handed to the client; only [`SessionManager`] reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct LiveSession {
    user_id: i64,
    expires_at: OffsetDateTime,
}

/// Issues signed session tokens and tracks which of them are still live.
///
/// The signature rejects tampered tokens; the registry lets `end` revoke a
/// token before its `exp`. A user may hold any number of sessions at once.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    live: RwLock<HashMap<Uuid, LiveSession>>,
}

/// Configured minutes as a duration, clamped to `0..=MAX_SESSION_TTL_MINUTES`.
fn session_ttl(minutes: i64) -> Duration {
    let minutes = minutes.clamp(0, MAX_SESSION_TTL_MINUTES) as u64;
    Duration::from_secs(minutes.checked_mul(60).unwrap_or(u64::MAX))
}

impl SessionManager {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: session_ttl(cfg.ttl_minutes),
            live: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn start(&self, user_id: i64) -> anyhow::Result<SessionToken> {
        let now = OffsetDateTime::now_utc();
        let ttl = TimeDuration::try_from(self.ttl).context("session ttl out of range")?;
        let exp = now.checked_add(ttl).context("session expiry out of range")?;
        let claims = Claims {
            sub: user_id,
            sid: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;

        let mut live = self.live.write().await;
        live.retain(|_, s| s.expires_at > now);
        live.insert(
            claims.sid,
            LiveSession {
                user_id,
                expires_at: exp,
            },
        );
        debug!(user_id, sid = %claims.sid, "session started");
        Ok(SessionToken(token))
    }

    /// User bound to `token`, or `None` when it is unknown, ended, expired or forged.
    pub async fn current_user_id(&self, token: &str) -> Option<i64> {
        let claims = match self.decode(token, true) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "rejected session token");
                return None;
            }
        };
        let live = self.live.read().await;
        let session = live.get(&claims.sid)?;
        if session.user_id != claims.sub || session.expires_at <= OffsetDateTime::now_utc() {
            return None;
        }
        Some(session.user_id)
    }

    /// Revokes `token`. Unknown, expired or already ended tokens are ignored.
    pub async fn end(&self, token: &str) {
        let Ok(claims) = self.decode(token, false) else {
            return;
        };
        if self.live.write().await.remove(&claims.sid).is_some() {
            debug!(user_id = claims.sub, sid = %claims.sid, "session ended");
        }
    }

    fn decode(&self, token: &str, check_exp: bool) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = check_exp;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    #[cfg(test)]
    async fn live_count(&self) -> usize {
        self.live.read().await.len()
    }
}
