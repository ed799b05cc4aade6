//! Genre pages

use axum::extract::{Path, State};
use axum_extra::extract::Form;
use serde_json::json;
use uuid::Uuid;

use super::view::View;
use crate::{
    error::AppResult,
    models::{book::BookResource, genre::GenreResource, Book, EntityKind, GenreForm},
    services::{DeleteOutcome, FormOutcome},
    AppState,
};

fn books(books: &[Book]) -> Vec<BookResource> {
    books.iter().map(BookResource::from).collect()
}

pub async fn genre_list(State(state): State<AppState>) -> AppResult<View> {
    let genres = state.services.genres.list().await?;
    let genres: Vec<GenreResource> = genres.iter().map(GenreResource::from).collect();
    Ok(View::render("genre_list", "Genre List", json!({ "genre_list": genres })))
}

pub async fn genre_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let detail = state.services.genres.detail(id).await?;
    Ok(View::render(
        "genre_detail",
        "Genre Detail",
        json!({
            "genre": GenreResource::from(&detail.genre),
            "genre_books": books(&detail.books),
        }),
    ))
}

pub async fn genre_create_get() -> View {
    View::render("genre_form", "Create Genre", json!({}))
}

/// Saving, or finding the genre already there, both land on its page.
pub async fn genre_create_post(
    State(state): State<AppState>,
    Form(form): Form<GenreForm>,
) -> AppResult<View> {
    Ok(match state.services.genres.create(&form).await? {
        FormOutcome::Saved(genre) | FormOutcome::Existing(genre) => View::redirect(genre.url()),
        FormOutcome::Invalid { form, errors } => View::render_errors(
            "genre_form",
            "Create Genre",
            json!({ "genre": form }),
            &errors,
        ),
    })
}

pub async fn genre_delete_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let detail = state.services.genres.delete_form(id).await?;
    Ok(View::render(
        "genre_delete",
        "Delete Genre",
        json!({
            "genre": GenreResource::from(&detail.genre),
            "genre_books": books(&detail.books),
        }),
    ))
}

pub async fn genre_delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    Ok(match state.services.genres.delete(id).await? {
        DeleteOutcome::Deleted => View::redirect(EntityKind::Genre.list_path()),
        DeleteOutcome::Blocked { entity, dependents } => View::render(
            "genre_delete",
            "Delete Genre",
            json!({
                "genre": GenreResource::from(&entity),
                "genre_books": books(&dependents),
            }),
        ),
    })
}

pub async fn genre_update_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let genre = state.services.genres.update_form(id).await?;
    Ok(View::render(
        "genre_form",
        "Update Genre",
        json!({ "genre": GenreResource::from(&genre) }),
    ))
}

pub async fn genre_update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<GenreForm>,
) -> AppResult<View> {
    Ok(match state.services.genres.update(id, &form).await? {
        FormOutcome::Saved(genre) | FormOutcome::Existing(genre) => View::redirect(genre.url()),
        FormOutcome::Invalid { form, errors } => View::render_errors(
            "genre_form",
            "Update Genre",
            json!({ "genre": form }),
            &errors,
        ),
    })
}
