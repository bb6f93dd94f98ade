use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_authz::Role;
use shelf_db::query::FilterField;
use time::OffsetDateTime;

use crate::modules::books::models::Book;

/// Where a reader is with a book on their readlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[default]
    Reading,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadlistEntry {
    pub book_id: String,
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Stored user document. Holds the password hash, so it never leaves the
/// service; responses use [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub wishlist: Vec<String>,
    #[serde(default)]
    pub readlist: Vec<ReadlistEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub wishlist: Vec<String>,
    pub readlist: Vec<ReadlistEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            bio: user.bio,
            wishlist: user.wishlist,
            readlist: user.readlist,
            created_at: user.created_at,
        }
    }
}

/// Readlist entry with its book resolved. `book` is `None` when the book has
/// since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadlistItem {
    pub book_id: String,
    pub book: Option<Book>,
    pub status: ReadingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A user with wishlist and readlist populated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub wishlist: Vec<Book>,
    pub readlist: Vec<ReadlistItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
}

impl CreateUser {
    pub fn problems(&self) -> Vec<serde_json::Value> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push(json!({ "field": "name", "error": "required" }));
        }
        if !is_email(&self.email) {
            problems.push(json!({ "field": "email", "error": "invalid email" }));
        }
        if self.password.is_empty() {
            problems.push(json!({ "field": "password", "error": "required" }));
        }
        problems
    }
}

/// Partial profile update. Fields not listed here (`id`, `role`, lists) are
/// ignored when present in the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UpdateUser {
    pub fn problems(&self) -> Vec<serde_json::Value> {
        let mut problems = Vec::new();
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            problems.push(json!({ "field": "name", "error": "must not be blank" }));
        }
        if self.email.as_deref().is_some_and(|email| !is_email(email)) {
            problems.push(json!({ "field": "email", "error": "invalid email" }));
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            problems.push(json!({ "field": "password", "error": "must not be blank" }));
        }
        problems
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistPayload {
    pub book_id: String,
}

/// Body of the readlist endpoints. There is no `status`: the service decides
/// it, and a `status` key in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadlistPayload {
    pub book_id: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ReadlistPayload {
    pub fn problems(&self) -> Vec<serde_json::Value> {
        let mut problems = Vec::new();
        if self.book_id.trim().is_empty() {
            problems.push(json!({ "field": "bookId", "error": "required" }));
        }
        if self.progress.is_some_and(|progress| progress > 100) {
            problems.push(json!({ "field": "progress", "error": "must be between 0 and 100" }));
        }
        problems
    }
}

fn is_email(raw: &str) -> bool {
    let raw = raw.trim();
    match raw.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !raw.contains(' '),
        None => false,
    }
}

/// Filterable user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Name,
    Email,
    Role,
}

impl FilterField for UserField {
    const SEARCHABLE: &'static [&'static str] = &["name", "email"];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Role => "role",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_public() {
        let user = User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "$argon2id$secret".to_string(),
            role: Role::User,
            bio: None,
            wishlist: vec![],
            readlist: vec![],
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let value = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["role"], json!("user"));
    }

    #[test]
    fn readlist_entry_defaults_to_reading() {
        let entry: ReadlistEntry = serde_json::from_value(json!({ "bookId": "b1" })).unwrap();
        assert_eq!(entry.status, ReadingStatus::Reading);
        assert_eq!(entry.progress, None);
    }

    #[test]
    fn create_user_checks_fields() {
        let payload = CreateUser {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            password: String::new(),
            bio: None,
        };
        let fields: Vec<_> = payload
            .problems()
            .into_iter()
            .map(|p| p["field"].clone())
            .collect();
        assert_eq!(fields, vec![json!("email"), json!("password")]);
    }

    #[test]
    fn update_ignores_role_and_id() {
        let update: UpdateUser =
            serde_json::from_value(json!({ "role": "admin", "id": "x", "bio": "hi" })).unwrap();
        assert_eq!(update.bio.as_deref(), Some("hi"));
        assert!(update.name.is_none());
        assert!(update.problems().is_empty());
    }

    #[test]
    fn readlist_payload_ignores_status() {
        let payload: ReadlistPayload =
            serde_json::from_value(json!({ "bookId": "b1", "status": "finished" })).unwrap();
        assert_eq!(payload.book_id, "b1");
        assert!(payload.problems().is_empty());
    }

    #[test]
    fn readlist_progress_is_bounded() {
        let payload = ReadlistPayload {
            book_id: "b1".to_string(),
            progress: Some(101),
            ..Default::default()
        };
        assert_eq!(payload.problems().len(), 1);
    }
}
