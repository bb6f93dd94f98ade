use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_app::App;
use shelf_kernel::Settings;
use tower::ServiceExt;

async fn router() -> Router {
    let mut settings = Settings::default();
    settings.auth.password_hash_cost = 1;
    App::build(settings).await.unwrap().router()
}

struct Call<'a> {
    method: &'a str,
    uri: &'a str,
    user: Option<(&'a str, &'a str)>,
    body: Option<Value>,
}

impl<'a> Call<'a> {
    fn new(method: &'a str, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            user: None,
            body: None,
        }
    }

    fn as_user(mut self, id: &'a str) -> Self {
        self.user = Some((id, "user"));
        self
    }

    fn as_admin(mut self, id: &'a str) -> Self {
        self.user = Some((id, "admin"));
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    async fn send(self, router: &Router) -> (StatusCode, Value) {
        let mut request = Request::builder().method(self.method).uri(self.uri);
        if let Some((id, role)) = self.user {
            request = request.header("x-user-id", id).header("x-user-role", role);
        }
        let request = match self.body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

async fn register(router: &Router, name: &str, email: &str) -> String {
    let (status, body) = Call::new("POST", "/api/users")
        .json(json!({ "name": name, "email": email, "password": "pw" }))
        .send(router)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn add_book(router: &Router, title: &str, year: i32) -> String {
    let (status, body) = Call::new("POST", "/api/books")
        .as_user("librarian")
        .json(json!({
            "title": title,
            "author": "Frank Herbert",
            "genre": "Science Fiction",
            "publicationYear": year
        }))
        .send(router)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn wishlist_toggle_end_to_end() {
    let router = router().await;
    let user = register(&router, "Ada", "ada@example.com").await;
    let book = add_book(&router, "Dune", 1965).await;

    let (status, body) = Call::new("POST", "/api/users/me/wishlist")
        .as_user(&user)
        .json(json!({ "bookId": book }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wishlist"][0]["title"], "Dune");

    let (status, body) = Call::new("POST", "/api/users/me/wishlist")
        .as_user(&user)
        .json(json!({ "bookId": book }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "book already in wishlist");

    let uri = format!("/api/users/me/wishlist/{}", book);
    let (status, body) = Call::new("DELETE", &uri).as_user(&user).send(&router).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wishlist"], json!([]));

    let (status, body) = Call::new("DELETE", &uri).as_user(&user).send(&router).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "book already removed from wishlist");
}

#[tokio::test]
async fn search_term_pages_with_full_total() {
    let router = router().await;
    add_book(&router, "Dune", 1965).await;
    add_book(&router, "Dune Messiah", 1969).await;
    add_book(&router, "The Dosadi Experiment", 1977).await;
    add_book(&router, "Children of Dune", 1976).await;

    let (status, body) = Call::new(
        "GET",
        "/api/books?searchTerm=dune&limit=2&page=1&sortBy=publicationYear&sortOrder=asc",
    )
    .send(&router)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"], json!({ "page": 1, "limit": 2, "total": 3 }));
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Dune", "Dune Messiah"]);
}

#[tokio::test]
async fn unknown_filter_field_is_rejected() {
    let router = router().await;
    let (status, body) = Call::new("GET", "/api/books?isbn=123").send(&router).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let router = router().await;
    register(&router, "Ada", "ada@example.com").await;

    let (status, body) = Call::new("POST", "/api/users")
        .json(json!({ "name": "Imposter", "email": "ada@example.com", "password": "pw" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn mark_finished_moves_book_to_front() {
    let router = router().await;
    let user = register(&router, "Ada", "ada@example.com").await;
    let first = add_book(&router, "Dune", 1965).await;
    let second = add_book(&router, "Dune Messiah", 1969).await;

    for book in [&first, &second] {
        let (status, _) = Call::new("POST", "/api/users/me/readlist")
            .as_user(&user)
            .json(json!({ "bookId": book, "progress": 10 }))
            .send(&router)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = Call::new("PATCH", "/api/users/me/readlist/finished")
        .as_user(&user)
        .json(json!({ "bookId": second }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);
    let readlist = &body["data"]["readlist"];
    assert_eq!(readlist[0]["bookId"], second.as_str());
    assert_eq!(readlist[0]["status"], "finished");
    assert_eq!(readlist[0]["progress"], 100);
    assert_eq!(readlist[0]["book"]["title"], "Dune Messiah");
    assert_eq!(readlist[1]["bookId"], first.as_str());
    assert_eq!(readlist[1]["status"], "reading");

    let (status, body) = Call::new("PATCH", "/api/users/me/readlist/finished")
        .as_user(&user)
        .json(json!({ "bookId": "never-added" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "book not in readlist");
}

#[tokio::test]
async fn account_routes_enforce_identity() {
    let router = router().await;
    let ada = register(&router, "Ada", "ada@example.com").await;
    let bob = register(&router, "Bob", "bob@example.com").await;

    let (status, _) = Call::new("GET", "/api/users/me").send(&router).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = Call::new("GET", "/api/users").as_user(&ada).send(&router).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = Call::new("GET", "/api/users?role=user")
        .as_admin("root")
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    assert!(body["data"][0].get("password").is_none());

    let uri = format!("/api/users/{}", bob);
    let (status, _) = Call::new("GET", &uri).as_user(&ada).send(&router).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = Call::new("PATCH", &uri)
        .as_user(&bob)
        .json(json!({ "bio": "reads a lot", "role": "admin" }))
        .send(&router)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "reads a lot");
    assert_eq!(body["data"]["role"], "user");

    let (status, _) = Call::new("DELETE", &uri).as_admin("root").send(&router).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = Call::new("GET", &uri).as_admin("root").send(&router).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_covers_modules() {
    let router = router().await;
    let (status, body) = Call::new("GET", "/docs/openapi.json").send(&router).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/books"]["post"].is_object());
    assert!(body["paths"]["/api/users/me/readlist/finished"]["patch"].is_object());
    assert!(body["components"]["schemas"]["Book"].is_object());
}
