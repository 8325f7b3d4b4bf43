//! Record model.
//!
//! Field names are English in Rust and Portuguese on the wire (JSON and CSV),
//! which is what existing clients of the catalog send and expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Identity assigned by the [`crate::CatalogStore`]. Starts at 1.
pub type ObraId = u64;

/// The fields a client may supply when creating or replacing a work.
///
/// Unknown JSON keys (including `id`, `created_at`, `updated_at`) are
/// ignored on input, so a client can never pick identity or timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateObra {
    #[serde(rename = "titulo")]
    #[validate(length(min = 1, message = "titulo must not be empty"))]
    pub title: String,

    #[serde(rename = "editora")]
    pub publisher: String,

    /// Expected to be a URL; not checked.
    #[serde(rename = "foto")]
    pub photo: String,

    #[serde(rename = "autores")]
    pub authors: Vec<String>,
}

/// A stored work: the client fields plus server-managed identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Obra {
    #[serde(rename = "titulo")]
    pub title: String,

    #[serde(rename = "editora")]
    pub publisher: String,

    #[serde(rename = "foto")]
    pub photo: String,

    #[serde(rename = "autores")]
    pub authors: Vec<String>,

    pub id: ObraId,

    /// Set once, at insertion.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful update; never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
}

impl Obra {
    pub(crate) fn new(
        request: CreateObra,
        id: ObraId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let CreateObra {
            title,
            publisher,
            photo,
            authors,
        } = request;
        Self {
            title,
            publisher,
            photo,
            authors,
            id,
            created_at,
            updated_at,
        }
    }

    /// The client-supplied part of this record.
    pub fn to_request(&self) -> CreateObra {
        CreateObra {
            title: self.title.clone(),
            publisher: self.publisher.clone(),
            photo: self.photo.clone(),
            authors: self.authors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_obra_uses_portuguese_keys() {
        let req: CreateObra = serde_json::from_value(json!({
            "titulo": "A",
            "editora": "E",
            "foto": "u",
            "autores": ["X"],
        }))
        .unwrap();
        assert_eq!(req.title, "A");
        assert_eq!(req.authors, vec!["X".to_owned()]);
    }

    #[test]
    fn create_obra_ignores_server_managed_fields() {
        let req: CreateObra = serde_json::from_value(json!({
            "titulo": "A",
            "editora": "E",
            "foto": "u",
            "autores": [],
            "id": 99,
            "created_at": "2000-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(req.title, "A");
        assert!(req.authors.is_empty());
    }

    #[test]
    fn empty_title_fails_validation() {
        let req = CreateObra {
            title: String::new(),
            publisher: "E".into(),
            photo: "u".into(),
            authors: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn obra_serializes_all_fields() {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let obra = Obra::new(
            CreateObra {
                title: "A".into(),
                publisher: "E".into(),
                photo: "u".into(),
                authors: vec!["X".into()],
            },
            1,
            at,
            at,
        );
        let value = serde_json::to_value(&obra).unwrap();
        assert_eq!(value["titulo"], "A");
        assert_eq!(value["editora"], "E");
        assert_eq!(value["foto"], "u");
        assert_eq!(value["autores"], json!(["X"]));
        assert_eq!(value["id"], 1);
        assert_eq!(value["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(value["updated_at"], "2024-01-01T00:00:00Z");
    }
}
