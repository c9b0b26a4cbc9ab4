use serde::Deserialize;

/// Form body for `POST /criar_noticia`.
#[derive(Debug, Default, Deserialize)]
pub struct PublishForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}
