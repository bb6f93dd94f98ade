use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_db::query::FilterField;
use time::OffsetDateTime;

/// A catalogue entry. Books are owned by nobody; `owner_id` records who
/// added them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateBook {
    /// Field-level problems with the payload, empty when valid
    pub fn problems(&self) -> Vec<serde_json::Value> {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("genre", &self.genre),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| json!({ "field": field, "error": "required" }))
        .collect()
    }
}

/// Filterable book fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Genre,
    PublicationYear,
}

impl FilterField for BookField {
    const SEARCHABLE: &'static [&'static str] = &["title", "author", "genre"];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "genre" => Some(Self::Genre),
            "publicationYear" => Some(Self::PublicationYear),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Genre => "genre",
            Self::PublicationYear => "publicationYear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_required_fields_are_reported() {
        let payload = CreateBook {
            title: "Dune".to_string(),
            author: "  ".to_string(),
            ..Default::default()
        };
        let problems = payload.problems();
        assert_eq!(
            problems,
            vec![
                json!({"field": "author", "error": "required"}),
                json!({"field": "genre", "error": "required"}),
            ]
        );
    }

    #[test]
    fn filter_fields_are_whitelisted() {
        assert_eq!(BookField::parse("publicationYear"), Some(BookField::PublicationYear));
        assert_eq!(BookField::parse("ownerId"), None);
        assert_eq!(BookField::parse("Title"), None);
    }

    #[test]
    fn book_serializes_camel_case() {
        let book = Book {
            id: "b1".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Science Fiction".to_string(),
            publication_year: Some(1965),
            description: None,
            owner_id: "u1".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["publicationYear"], json!(1965));
        assert_eq!(value["ownerId"], json!("u1"));
        assert_eq!(value["createdAt"], json!("1970-01-01T00:00:00Z"));
        assert!(value.get("description").is_none());
    }
}
