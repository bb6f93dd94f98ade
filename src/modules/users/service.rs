use std::collections::HashMap;

use anyhow::Context as _;
use shelf_authz::Role;
use shelf_db::{
    from_document,
    query::{calculate_pagination, Filters, Paginated, PaginationOptions},
    to_document, DbResult, Document, Predicate, Update,
};
use shelf_http::AppError;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{
    CreateUser, PublicUser, ReadingStatus, ReadlistEntry, ReadlistItem, ReadlistPayload,
    UpdateUser, User, UserField, UserProfile,
};
use crate::context::AppContext;
use crate::modules::books::service::BookService;

pub const COLLECTION: &str = "users";

const WISHLIST: &str = "wishlist";
const READLIST: &str = "readlist";
const BOOK_ID: &str = "bookId";

fn user_not_found() -> AppError {
    AppError::not_found("user not found")
}

#[derive(Clone)]
pub struct UserService {
    ctx: AppContext,
    books: BookService,
}

impl UserService {
    pub fn new(ctx: AppContext, books: BookService) -> Self {
        Self { ctx, books }
    }

    /// Register a user. The email is unique across users.
    pub async fn create_user(&self, payload: CreateUser) -> Result<PublicUser, AppError> {
        let problems = payload.problems();
        if !problems.is_empty() {
            return Err(AppError::validation(problems, "invalid user payload"));
        }

        let user = User {
            id: Uuid::now_v7().to_string(),
            name: payload.name.trim().to_string(),
            email: normalize_email(&payload.email),
            password: self.hash_password(payload.password).await?,
            role: Role::User,
            bio: payload.bio,
            wishlist: Vec::new(),
            readlist: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };

        self.ctx.store.insert(COLLECTION, to_document(&user)?).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    pub async fn list_users(
        &self,
        options: &PaginationOptions,
        filters: &Filters,
    ) -> Result<Paginated<PublicUser>, AppError> {
        let predicate = self.ctx.filters.build::<UserField>(filters)?;
        let pagination = calculate_pagination(options, self.ctx.pagination);

        let total = self.ctx.store.count(COLLECTION, &predicate).await?;
        let documents = self
            .ctx
            .store
            .find(COLLECTION, &predicate, &pagination.find_options())
            .await?;
        let users = documents
            .into_iter()
            .map(decode)
            .collect::<DbResult<Vec<User>>>()?;

        Ok(Paginated::new(&pagination, total, users).map(PublicUser::from))
    }

    pub async fn get_user(&self, id: &str) -> Result<PublicUser, AppError> {
        Ok(self.fetch(id).await?.into())
    }

    /// Apply a partial update. A new password is hashed before it is stored;
    /// `role` and `id` are not updatable.
    pub async fn update_user(&self, id: &str, payload: UpdateUser) -> Result<PublicUser, AppError> {
        let problems = payload.problems();
        if !problems.is_empty() {
            return Err(AppError::validation(problems, "invalid user payload"));
        }

        let mut update = Update::new();
        if let Some(name) = payload.name {
            update = update.set("name", name.trim());
        }
        if let Some(email) = payload.email {
            update = update.set("email", normalize_email(&email));
        }
        if let Some(bio) = payload.bio {
            update = update.set("bio", bio);
        }
        if let Some(password) = payload.password {
            update = update.set("password", self.hash_password(password).await?);
        }

        let document = self
            .ctx
            .store
            .update_one(COLLECTION, id, &Predicate::All, &update)
            .await?
            .ok_or_else(user_not_found)?;

        let fields: Vec<&str> = update.fields().collect();
        tracing::info!(user_id = %id, ?fields, "user updated");
        Ok(decode(document)?.into())
    }

    pub async fn delete_user(&self, id: &str) -> Result<PublicUser, AppError> {
        let document = self
            .ctx
            .store
            .delete_one(COLLECTION, id)
            .await?
            .ok_or_else(user_not_found)?;

        tracing::info!(user_id = %id, "user deleted");
        Ok(decode(document)?.into())
    }

    pub async fn add_to_wishlist(&self, id: &str, book_id: &str) -> Result<UserProfile, AppError> {
        if !self.books.exists(book_id).await? {
            return Err(AppError::not_found("book not found"));
        }

        let guard = Predicate::not(Predicate::contains(WISHLIST, book_id));
        let update = Update::new().push(WISHLIST, book_id);
        let Some(document) = self.guarded_update(id, &guard, &update).await? else {
            return Err(self
                .classify(id, AppError::conflict(vec![], "book already in wishlist"))
                .await);
        };

        tracing::info!(user_id = %id, book_id, "book added to wishlist");
        self.populate(decode(document)?).await
    }

    pub async fn remove_from_wishlist(
        &self,
        id: &str,
        book_id: &str,
    ) -> Result<UserProfile, AppError> {
        let guard = Predicate::contains(WISHLIST, book_id);
        let update = Update::new().pull(WISHLIST, book_id);
        let Some(document) = self.guarded_update(id, &guard, &update).await? else {
            return Err(self
                .classify(
                    id,
                    AppError::conflict(vec![], "book already removed from wishlist"),
                )
                .await);
        };

        tracing::info!(user_id = %id, book_id, "book removed from wishlist");
        self.populate(decode(document)?).await
    }

    /// Start tracking a book. New entries are always `reading`; only
    /// `mark_finished` moves an entry to `finished`.
    pub async fn add_to_readlist(
        &self,
        id: &str,
        payload: ReadlistPayload,
    ) -> Result<UserProfile, AppError> {
        let problems = payload.problems();
        if !problems.is_empty() {
            return Err(AppError::validation(problems, "invalid readlist entry"));
        }
        if !self.books.exists(&payload.book_id).await? {
            return Err(AppError::not_found("book not found"));
        }

        let entry = ReadlistEntry {
            book_id: payload.book_id,
            status: ReadingStatus::Reading,
            progress: payload.progress,
            note: payload.note,
        };
        let guard = Predicate::not(Predicate::elem_match(
            READLIST,
            BOOK_ID,
            entry.book_id.as_str(),
        ));
        let update = Update::new().push(READLIST, entry_value(&entry)?);
        let Some(document) = self.guarded_update(id, &guard, &update).await? else {
            return Err(self
                .classify(id, AppError::conflict(vec![], "book already in readlist"))
                .await);
        };

        tracing::info!(user_id = %id, book_id = %entry.book_id, "book added to readlist");
        self.populate(decode(document)?).await
    }

    /// Mark a tracked book finished and move it to the front of the readlist.
    /// Progress defaults to 100.
    pub async fn mark_finished(
        &self,
        id: &str,
        payload: ReadlistPayload,
    ) -> Result<UserProfile, AppError> {
        let problems = payload.problems();
        if !problems.is_empty() {
            return Err(AppError::validation(problems, "invalid readlist entry"));
        }

        let entry = ReadlistEntry {
            book_id: payload.book_id,
            status: ReadingStatus::Finished,
            progress: Some(payload.progress.unwrap_or(100)),
            note: payload.note,
        };
        let guard = Predicate::elem_match(READLIST, BOOK_ID, entry.book_id.as_str());
        let update = Update::new()
            .pull_by(READLIST, BOOK_ID, entry.book_id.as_str())
            .push_front(READLIST, entry_value(&entry)?);
        let Some(document) = self.guarded_update(id, &guard, &update).await? else {
            return Err(self
                .classify(id, AppError::not_found("book not in readlist"))
                .await);
        };

        tracing::info!(user_id = %id, book_id = %entry.book_id, "book marked finished");
        self.populate(decode(document)?).await
    }

    /// The user with wishlist and readlist books resolved
    pub async fn get_user_profile(&self, id: &str) -> Result<UserProfile, AppError> {
        let user = self.fetch(id).await?;
        self.populate(user).await
    }

    async fn fetch(&self, id: &str) -> Result<User, AppError> {
        let document = self
            .ctx
            .store
            .find_by_id(COLLECTION, id)
            .await?
            .ok_or_else(user_not_found)?;
        Ok(decode(document)?)
    }

    async fn populate(&self, user: User) -> Result<UserProfile, AppError> {
        let wishlist = self.books.find_many(&user.wishlist).await?;

        let readlist_ids: Vec<String> = user
            .readlist
            .iter()
            .map(|entry| entry.book_id.clone())
            .collect();
        let mut books: HashMap<String, _> = self
            .books
            .find_many(&readlist_ids)
            .await?
            .into_iter()
            .map(|book| (book.id.clone(), book))
            .collect();
        let readlist = user
            .readlist
            .into_iter()
            .map(|entry| ReadlistItem {
                book: books.remove(&entry.book_id),
                book_id: entry.book_id,
                status: entry.status,
                progress: entry.progress,
                note: entry.note,
            })
            .collect();

        Ok(UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            bio: user.bio,
            wishlist,
            readlist,
            created_at: user.created_at,
        })
    }

    async fn guarded_update(
        &self,
        id: &str,
        guard: &Predicate,
        update: &Update,
    ) -> DbResult<Option<Document>> {
        self.ctx.store.update_one(COLLECTION, id, guard, update).await
    }

    /// A guarded update matched nothing: either the user is gone or the
    /// guard failed
    async fn classify(&self, id: &str, guard_failed: AppError) -> AppError {
        match self.ctx.store.find_by_id(COLLECTION, id).await {
            Ok(Some(_)) => guard_failed,
            Ok(None) => user_not_found(),
            Err(err) => err.into(),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.ctx.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task failed")??;
        Ok(hash)
    }
}

fn decode(document: Document) -> DbResult<User> {
    from_document(document)
}

fn entry_value(entry: &ReadlistEntry) -> DbResult<serde_json::Value> {
    Ok(serde_json::to_value(entry)?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
