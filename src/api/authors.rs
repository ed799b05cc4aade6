//! Author pages

use axum::extract::{Path, State};
use axum_extra::extract::Form;
use serde_json::json;
use uuid::Uuid;

use super::view::View;
use crate::{
    error::AppResult,
    models::{author::AuthorResource, book::BookResource, AuthorForm, Book, EntityKind},
    services::{DeleteOutcome, FormOutcome},
    AppState,
};

fn books(books: &[Book]) -> Vec<BookResource> {
    books.iter().map(BookResource::from).collect()
}

pub async fn author_list(State(state): State<AppState>) -> AppResult<View> {
    let authors = state.services.authors.list().await?;
    let authors: Vec<AuthorResource> = authors.iter().map(AuthorResource::from).collect();
    Ok(View::render(
        "author_list",
        "Author List",
        json!({ "author_list": authors }),
    ))
}

pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let detail = state.services.authors.detail(id).await?;
    Ok(View::render(
        "author_detail",
        "Author Detail",
        json!({
            "author": AuthorResource::from(&detail.author),
            "author_books": books(&detail.books),
        }),
    ))
}

pub async fn author_create_get() -> View {
    View::render("author_form", "Create Author", json!({}))
}

pub async fn author_create_post(
    State(state): State<AppState>,
    Form(form): Form<AuthorForm>,
) -> AppResult<View> {
    Ok(match state.services.authors.create(&form).await? {
        FormOutcome::Saved(author) | FormOutcome::Existing(author) => View::redirect(author.url()),
        FormOutcome::Invalid { form, errors } => View::render_errors(
            "author_form",
            "Create Author",
            json!({ "author": form }),
            &errors,
        ),
    })
}

pub async fn author_delete_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let detail = state.services.authors.delete_form(id).await?;
    Ok(View::render(
        "author_delete",
        "Delete Author",
        json!({
            "author": AuthorResource::from(&detail.author),
            "author_books": books(&detail.books),
        }),
    ))
}

pub async fn author_delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    Ok(match state.services.authors.delete(id).await? {
        DeleteOutcome::Deleted => View::redirect(EntityKind::Author.list_path()),
        DeleteOutcome::Blocked { entity, dependents } => View::render(
            "author_delete",
            "Delete Author",
            json!({
                "author": AuthorResource::from(&entity),
                "author_books": books(&dependents),
            }),
        ),
    })
}

pub async fn author_update_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let author = state.services.authors.update_form(id).await?;
    Ok(View::render(
        "author_form",
        "Update Author",
        json!({ "author": AuthorResource::from(&author) }),
    ))
}

pub async fn author_update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<AuthorForm>,
) -> AppResult<View> {
    Ok(match state.services.authors.update(id, &form).await? {
        FormOutcome::Saved(author) | FormOutcome::Existing(author) => View::redirect(author.url()),
        FormOutcome::Invalid { form, errors } => View::render_errors(
            "author_form",
            "Update Author",
            json!({ "author": form }),
            &errors,
        ),
    })
}
