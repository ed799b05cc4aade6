//! Book pages

use axum::extract::{Path, State};
use axum_extra::extract::Form;
use serde_json::{json, Value};
use uuid::Uuid;

use super::view::View;
use crate::{
    error::AppResult,
    models::{
        author::AuthorResource, book::BookResource, book_instance::BookInstanceResource,
        genre::GenreResource, BookForm, EntityKind,
    },
    services::{
        books::{BookDetail, BookFormContext},
        DeleteOutcome, FormOutcome,
    },
    AppState,
};

fn detail_context(detail: &BookDetail) -> Value {
    let instances: Vec<BookInstanceResource> =
        detail.instances.iter().map(BookInstanceResource::from).collect();
    let genres: Vec<GenreResource> = detail.genres.iter().map(GenreResource::from).collect();
    json!({
        "book": BookResource::from(&detail.book),
        "author": detail.author.as_ref().map(AuthorResource::from),
        "genres": genres,
        "book_instances": instances,
    })
}

fn form_context(context: &BookFormContext) -> Value {
    let authors: Vec<AuthorResource> = context.authors.iter().map(AuthorResource::from).collect();
    json!({
        "authors": authors,
        "genres": context.genres,
        "book": context.book,
    })
}

pub async fn book_list(State(state): State<AppState>) -> AppResult<View> {
    let entries = state.services.books.list().await?;
    let books: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "book": BookResource::from(&entry.book),
                "author": entry.author.as_ref().map(AuthorResource::from),
            })
        })
        .collect();
    Ok(View::render("book_list", "Book List", json!({ "book_list": books })))
}

pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let detail = state.services.books.detail(id).await?;
    Ok(View::render("book_detail", detail.book.title.clone(), detail_context(&detail)))
}

pub async fn book_create_get(State(state): State<AppState>) -> AppResult<View> {
    let context = state.services.books.create_form().await?;
    Ok(View::render("book_form", "Create Book", form_context(&context)))
}

pub async fn book_create_post(
    State(state): State<AppState>,
    Form(form): Form<BookForm>,
) -> AppResult<View> {
    Ok(match state.services.books.create(&form).await? {
        FormOutcome::Saved(book) | FormOutcome::Existing(book) => View::redirect(book.url()),
        FormOutcome::Invalid { form, errors } => {
            View::render_errors("book_form", "Create Book", form_context(&form), &errors)
        }
    })
}

pub async fn book_delete_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let detail = state.services.books.delete_form(id).await?;
    Ok(View::render("book_delete", "Delete Book", detail_context(&detail)))
}

pub async fn book_delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    Ok(match state.services.books.delete(id).await? {
        DeleteOutcome::Deleted => View::redirect(EntityKind::Book.list_path()),
        DeleteOutcome::Blocked { entity, dependents } => {
            let instances: Vec<BookInstanceResource> =
                dependents.iter().map(BookInstanceResource::from).collect();
            View::render(
                "book_delete",
                "Delete Book",
                json!({
                    "book": BookResource::from(&entity),
                    "book_instances": instances,
                }),
            )
        }
    })
}

pub async fn book_update_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let context = state.services.books.update_form(id).await?;
    Ok(View::render("book_form", "Update Book", form_context(&context)))
}

pub async fn book_update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<BookForm>,
) -> AppResult<View> {
    Ok(match state.services.books.update(id, &form).await? {
        FormOutcome::Saved(book) | FormOutcome::Existing(book) => View::redirect(book.url()),
        FormOutcome::Invalid { form, errors } => {
            View::render_errors("book_form", "Update Book", form_context(&form), &errors)
        }
    })
}
