//! API integration tests
//!
//! Drive the full router over the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use library_catalog::{api, repository::Repository, AppConfig, AppState};

fn app() -> Router {
    api::router(AppState::new(AppConfig::default(), Repository::in_memory()))
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply {
        status,
        location,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> Reply {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, form: &str) -> Reply {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a form that must succeed and return the id from the redirect target
async fn create(app: &Router, uri: &str, form: &str) -> String {
    let reply = post(app, uri, form).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER, "body: {}", reply.body);
    let location = reply.location.expect("redirect location");
    location.rsplit('/').next().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let reply = get(&app, "/health").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
    assert_eq!(reply.body["storage"], "memory");

    let reply = get(&app, "/ready").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ready");
}

#[tokio::test]
async fn test_index_counts() {
    let app = app();
    let author = create(&app, "/catalog/author/create", "first_name=Frank&family_name=Herbert").await;
    create(&app, "/catalog/genre/create", "name=Science+Fiction").await;
    let book = create(
        &app,
        "/catalog/book/create",
        &format!("title=Dune&author={}&summary=Spice&isbn=9780441013593", author),
    )
    .await;
    create(
        &app,
        "/catalog/bookinstance/create",
        &format!("book={}&imprint=Ace&status=Available", book),
    )
    .await;
    create(
        &app,
        "/catalog/bookinstance/create",
        &format!("book={}&imprint=Ace", book),
    )
    .await;

    let reply = get(&app, "/catalog").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["view"], "index");
    assert_eq!(reply.body["error"], Value::Null);
    let data = &reply.body["data"];
    assert_eq!(data["book_count"], 1);
    assert_eq!(data["book_instance_count"], 2);
    assert_eq!(data["book_instance_available_count"], 1);
    assert_eq!(data["author_count"], 1);
    assert_eq!(data["genre_count"], 1);
}

#[tokio::test]
async fn test_author_create_with_empty_fields() {
    let app = app();
    let reply = post(&app, "/catalog/author/create", "first_name=&family_name=").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["view"], "author_form");
    let errors = reply.body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["message"], "First name must be specified");
    assert_eq!(errors[1]["message"], "Family name must be specified");

    let list = get(&app, "/catalog/authors").await;
    assert!(list.body["author_list"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_author_name_must_be_letters() {
    let app = app();
    let reply = post(&app, "/catalog/author/create", "first_name=Mark1&family_name=Twain").await;
    assert_eq!(
        reply.body["errors"][0]["message"],
        "First name should only contain letters"
    );
    assert_eq!(reply.body["author"]["first_name"], "Mark1");
}

#[tokio::test]
async fn test_author_detail_and_formatted_dates() {
    let app = app();
    let id = create(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02&date_of_death=1992-04-06",
    )
    .await;

    let reply = get(&app, &format!("/catalog/author/{}", id)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let author = &reply.body["author"];
    assert_eq!(author["name"], "Asimov, Isaac");
    assert_eq!(author["url"], format!("/catalog/author/{}", id));
    assert_eq!(author["lifespan"], "January 2nd, 1920 - April 6th, 1992");
    assert_eq!(author["date_of_birth_yyyy_mm_dd"], "1920-01-02");
}

#[tokio::test]
async fn test_missing_entity_is_not_found() {
    let app = app();
    let missing = uuid::Uuid::new_v4();
    for uri in [
        format!("/catalog/author/{}", missing),
        format!("/catalog/genre/{}", missing),
        format!("/catalog/book/{}", missing),
        format!("/catalog/bookinstance/{}", missing),
    ] {
        let reply = get(&app, &uri).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(reply.body["message"].is_string());
    }

    let reply = post(&app, &format!("/catalog/author/{}/delete", missing), "").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_genre_redirects_to_existing() {
    let app = app();
    let first = post(&app, "/catalog/genre/create", "name=Fantasy").await;
    let second = post(&app, "/catalog/genre/create", "name=++fantasy+").await;
    assert_eq!(first.status, StatusCode::SEE_OTHER);
    assert_eq!(second.status, StatusCode::SEE_OTHER);
    assert_eq!(first.location, second.location);

    let list = get(&app, "/catalog/genres").await;
    assert_eq!(list.body["genre_list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_book_genre_shapes() {
    let app = app();
    let author = create(&app, "/catalog/author/create", "first_name=Ursula&family_name=LeGuin").await;
    let fantasy = create(&app, "/catalog/genre/create", "name=Fantasy").await;
    let classic = create(&app, "/catalog/genre/create", "name=Classic").await;
    let base = format!("title=Earthsea&author={}&summary=Ged&isbn=9780547773742", author);

    let none = create(&app, "/catalog/book/create", &base).await;
    let reply = get(&app, &format!("/catalog/book/{}", none)).await;
    assert!(reply.body["book"]["genre"].as_array().unwrap().is_empty());
    assert!(reply.body["genres"].as_array().unwrap().is_empty());

    let one = create(&app, "/catalog/book/create", &format!("{}&genre={}", base, fantasy)).await;
    let reply = get(&app, &format!("/catalog/book/{}", one)).await;
    assert_eq!(reply.body["genres"][0]["name"], "Fantasy");

    let both = create(
        &app,
        "/catalog/book/create",
        &format!("{}&genre={}&genre={}", base, fantasy, classic),
    )
    .await;
    let reply = get(&app, &format!("/catalog/book/{}", both)).await;
    assert_eq!(reply.body["book"]["genre"].as_array().unwrap().len(), 2);
    assert_eq!(reply.body["author"]["name"], "LeGuin, Ursula");
}

#[tokio::test]
async fn test_rejected_book_form_keeps_checked_genres() {
    let app = app();
    let author = create(&app, "/catalog/author/create", "first_name=Ursula&family_name=LeGuin").await;
    let fantasy = create(&app, "/catalog/genre/create", "name=Fantasy").await;
    create(&app, "/catalog/genre/create", "name=Poetry").await;

    let reply = post(
        &app,
        "/catalog/book/create",
        &format!("title=&author={}&summary=Ged&isbn=1&genre={}", author, fantasy),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["view"], "book_form");
    assert_eq!(reply.body["errors"][0]["message"], "Title must not be empty");
    let genres = reply.body["genres"].as_array().unwrap();
    assert_eq!(genres[0]["name"], "Fantasy");
    assert_eq!(genres[0]["checked"], true);
    assert_eq!(genres[1]["checked"], false);
}

#[tokio::test]
async fn test_delete_author_blocked_then_allowed() {
    let app = app();
    let author = create(&app, "/catalog/author/create", "first_name=Frank&family_name=Herbert").await;
    let book = create(
        &app,
        "/catalog/book/create",
        &format!("title=Dune&author={}&summary=Spice&isbn=9780441013593", author),
    )
    .await;

    let reply = post(&app, &format!("/catalog/author/{}/delete", author), "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["view"], "author_delete");
    let blocking = reply.body["author_books"].as_array().unwrap();
    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0]["id"], book);

    let reply = post(&app, &format!("/catalog/book/{}/delete", book), "").await;
    assert_eq!(reply.location.as_deref(), Some("/catalog/books"));

    let reply = post(&app, &format!("/catalog/author/{}/delete", author), "").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/catalog/authors"));

    let index = get(&app, "/catalog").await;
    assert_eq!(index.body["data"]["author_count"], 0);
}

#[tokio::test]
async fn test_book_instance_update() {
    let app = app();
    let author = create(&app, "/catalog/author/create", "first_name=Frank&family_name=Herbert").await;
    let book = create(
        &app,
        "/catalog/book/create",
        &format!("title=Dune&author={}&summary=Spice&isbn=9780441013593", author),
    )
    .await;
    let copy = create(
        &app,
        "/catalog/bookinstance/create",
        &format!("book={}&imprint=Ace", book),
    )
    .await;

    let form = get(&app, &format!("/catalog/bookinstance/{}/update", copy)).await;
    assert_eq!(form.body["bookinstance"]["status"], "Maintenance");
    assert_eq!(form.body["selected_book"], book);

    let reply = post(
        &app,
        &format!("/catalog/bookinstance/{}/update", copy),
        &format!("book={}&imprint=Ace&status=Loaned&due_back=2024-03-01", book),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let detail = get(&app, &format!("/catalog/bookinstance/{}", copy)).await;
    assert_eq!(detail.body["bookinstance"]["status"], "Loaned");
    assert_eq!(detail.body["bookinstance"]["due_back_formatted"], "March 1st, 2024");
    assert_eq!(detail.body["book"]["title"], "Dune");
}

#[tokio::test]
async fn test_markup_is_escaped() {
    let app = app();
    let id = create(&app, "/catalog/genre/create", "name=%3Cb%3EHorror%3C%2Fb%3E").await;
    let reply = get(&app, &format!("/catalog/genre/{}", id)).await;
    tokio_test::assert_ok!(serde_json::to_string(&reply.body));
    assert_eq!(reply.body["genre"]["name"], "&lt;b&gt;Horror&lt;&#x2F;b&gt;");
}
