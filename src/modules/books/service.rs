use shelf_db::{
    from_document,
    query::{calculate_pagination, Filters, Paginated, PaginationOptions},
    to_document, DbResult, Document,
};
use shelf_http::AppError;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{Book, BookField, CreateBook};
use crate::context::AppContext;

pub const COLLECTION: &str = "books";

#[derive(Clone)]
pub struct BookService {
    ctx: AppContext,
}

impl BookService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Persist a new book tagged with the identity that created it
    pub async fn create_book(&self, payload: CreateBook, owner_id: &str) -> Result<Book, AppError> {
        let problems = payload.problems();
        if !problems.is_empty() {
            return Err(AppError::validation(problems, "invalid book payload"));
        }

        let book = Book {
            id: Uuid::now_v7().to_string(),
            title: payload.title.trim().to_string(),
            author: payload.author.trim().to_string(),
            genre: payload.genre.trim().to_string(),
            publication_year: payload.publication_year,
            description: payload.description,
            owner_id: owner_id.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        self.ctx.store.insert(COLLECTION, to_document(&book)?).await?;
        tracing::info!(book_id = %book.id, owner_id, "book created");
        Ok(book)
    }

    /// One page of books matching `filters`, with the total match count
    pub async fn list_books(
        &self,
        options: &PaginationOptions,
        filters: &Filters,
    ) -> Result<Paginated<Book>, AppError> {
        let predicate = self.ctx.filters.build::<BookField>(filters)?;
        let pagination = calculate_pagination(options, self.ctx.pagination);

        let total = self.ctx.store.count(COLLECTION, &predicate).await?;
        let documents = self
            .ctx
            .store
            .find(COLLECTION, &predicate, &pagination.find_options())
            .await?;

        Ok(Paginated::new(&pagination, total, decode(documents)?))
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, AppError> {
        let document = self
            .ctx
            .store
            .find_by_id(COLLECTION, id)
            .await?
            .ok_or_else(|| AppError::not_found("book not found"))?;
        Ok(from_document(document)?)
    }

    /// Resolve book ids in the given order, dropping ids that no longer exist
    pub async fn find_many(&self, ids: &[String]) -> Result<Vec<Book>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let documents = self.ctx.store.find_by_ids(COLLECTION, ids).await?;
        Ok(decode(documents)?)
    }

    pub async fn exists(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.ctx.store.find_by_id(COLLECTION, id).await?.is_some())
    }
}

fn decode(documents: Vec<Document>) -> DbResult<Vec<Book>> {
    documents.into_iter().map(from_document).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use shelf_db::{CollectionSpec, DocumentStore, MemoryStore};
    use shelf_kernel::Settings;

    pub(crate) async fn test_context() -> AppContext {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        store
            .define_collection(CollectionSpec::new(COLLECTION))
            .await
            .unwrap();
        store
            .define_collection(CollectionSpec::new("users").unique("email"))
            .await
            .unwrap();

        let mut settings = Settings::default();
        settings.auth.password_hash_cost = 1;
        AppContext::from_settings(&settings, store).unwrap()
    }

    pub(crate) fn payload(title: &str, author: &str, genre: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            ..Default::default()
        }
    }

    async fn seeded() -> BookService {
        let service = BookService::new(test_context().await);
        for (title, author, genre, year) in [
            ("Dune", "Frank Herbert", "Science Fiction", 1965),
            ("Dune Messiah", "Frank Herbert", "Science Fiction", 1969),
            ("Emma", "Jane Austen", "Romance", 1815),
            ("Children of Dune", "Frank Herbert", "Science Fiction", 1976),
        ] {
            let mut book = payload(title, author, genre);
            book.publication_year = Some(year);
            service.create_book(book, "u1").await.unwrap();
        }
        service
    }

    fn options(pairs: &[(&str, &str)]) -> PaginationOptions {
        let mut options = PaginationOptions::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "page" => options.page = value,
                "limit" => options.limit = value,
                "sortBy" => options.sort_by = value,
                "sortOrder" => options.sort_order = value,
                _ => unreachable!(),
            }
        }
        options
    }

    #[tokio::test]
    async fn create_book_tags_owner() {
        let service = BookService::new(test_context().await);
        let book = service
            .create_book(payload("  Dune ", "Frank Herbert", "Science Fiction"), "u7")
            .await
            .unwrap();

        assert_eq!(book.title, "Dune");
        assert_eq!(book.owner_id, "u7");
        assert_eq!(service.get_book(&book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn create_book_rejects_blank_fields() {
        let service = BookService::new(test_context().await);
        let err = service
            .create_book(payload("Dune", "", "Science Fiction"), "u1")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn search_term_counts_all_matches() {
        let service = seeded().await;
        let page = service
            .list_books(
                &options(&[("limit", "2"), ("sortBy", "publicationYear"), ("sortOrder", "desc")]),
                &Filters::search("dune"),
            )
            .await
            .unwrap();

        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.limit, 2);
        let titles: Vec<_> = page.data.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Children of Dune", "Dune Messiah"]);
    }

    #[tokio::test]
    async fn field_filters_narrow_results() {
        let service = seeded().await;
        let page = service
            .list_books(
                &PaginationOptions::default(),
                &Filters::default().with_field("publicationYear", "1965"),
            )
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].title, "Dune");
    }

    #[tokio::test]
    async fn unknown_filter_field_is_bad_request() {
        let service = seeded().await;
        let err = service
            .list_books(
                &PaginationOptions::default(),
                &Filters::default().with_field("ownerId", "u1"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let service = seeded().await;
        let err = service.get_book("nope").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn find_many_keeps_requested_order() {
        let service = seeded().await;
        let all = service
            .list_books(&PaginationOptions::default(), &Filters::default())
            .await
            .unwrap();
        let ids = vec![all.data[2].id.clone(), "gone".to_string(), all.data[0].id.clone()];

        let books = service.find_many(&ids).await.unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Emma", "Dune"]);
    }
}
