use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of the signed session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,    // user ID
    pub sid: Uuid,   // session ID, looked up in the live registry
    pub iat: usize,  // issued at
    pub exp: usize,  // expiration time
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Form body for `POST /cadastrar` and `POST /login`.
/// Missing fields deserialize as empty so they fail validation instead of the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Form body for `POST /perfil/editar`.
#[derive(Debug, Default, Deserialize)]
pub struct EditProfileForm {
    #[serde(default)]
    pub new_username: String,
}

/// Public part of the user handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
}

impl From<&crate::auth::repo_types::User> for PublicUser {
    fn from(u: &crate::auth::repo_types::User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
        }
    }
}
