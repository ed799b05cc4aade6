//! Book copy pages

use axum::extract::{Path, State};
use axum_extra::extract::Form;
use serde_json::{json, Value};
use uuid::Uuid;

use super::view::View;
use crate::{
    error::AppResult,
    models::{
        book::BookResource, book_instance::BookInstanceResource, BookInstanceForm, BookStatus,
        EntityKind,
    },
    services::{
        book_instances::{BookInstanceEntry, BookInstanceFormContext},
        DeleteOutcome, FormOutcome,
    },
    AppState,
};

fn entry_context(entry: &BookInstanceEntry) -> Value {
    json!({
        "bookinstance": BookInstanceResource::from(&entry.instance),
        "book": entry.book.as_ref().map(BookResource::from),
    })
}

fn form_context(context: &BookInstanceFormContext) -> Value {
    let books: Vec<BookResource> = context.books.iter().map(BookResource::from).collect();
    let statuses: Vec<&str> = BookStatus::ALL.iter().map(|s| s.as_str()).collect();
    json!({
        "book_list": books,
        "selected_book": context.instance.as_ref().and_then(|i| i.book),
        "bookinstance": context.instance,
        "statuses": statuses,
    })
}

pub async fn bookinstance_list(State(state): State<AppState>) -> AppResult<View> {
    let entries = state.services.book_instances.list().await?;
    let instances: Vec<Value> = entries.iter().map(entry_context).collect();
    Ok(View::render(
        "bookinstance_list",
        "Book Instance List",
        json!({ "bookinstance_list": instances }),
    ))
}

pub async fn bookinstance_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let entry = state.services.book_instances.detail(id).await?;
    Ok(View::render("bookinstance_detail", "Book:", entry_context(&entry)))
}

pub async fn bookinstance_create_get(State(state): State<AppState>) -> AppResult<View> {
    let context = state.services.book_instances.create_form().await?;
    Ok(View::render(
        "bookinstance_form",
        "Create BookInstance",
        form_context(&context),
    ))
}

pub async fn bookinstance_create_post(
    State(state): State<AppState>,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<View> {
    Ok(match state.services.book_instances.create(&form).await? {
        FormOutcome::Saved(instance) | FormOutcome::Existing(instance) => {
            View::redirect(instance.url())
        }
        FormOutcome::Invalid { form, errors } => View::render_errors(
            "bookinstance_form",
            "Create BookInstance",
            form_context(&form),
            &errors,
        ),
    })
}

pub async fn bookinstance_delete_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let entry = state.services.book_instances.delete_form(id).await?;
    Ok(View::render(
        "bookinstance_delete",
        "Delete BookInstance",
        entry_context(&entry),
    ))
}

pub async fn bookinstance_delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    Ok(match state.services.book_instances.delete(id).await? {
        DeleteOutcome::Deleted => View::redirect(EntityKind::BookInstance.list_path()),
        DeleteOutcome::Blocked { entity, .. } => View::render(
            "bookinstance_delete",
            "Delete BookInstance",
            json!({ "bookinstance": BookInstanceResource::from(&entity) }),
        ),
    })
}

pub async fn bookinstance_update_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<View> {
    let context = state.services.book_instances.update_form(id).await?;
    Ok(View::render(
        "bookinstance_form",
        "Update BookInstance",
        form_context(&context),
    ))
}

pub async fn bookinstance_update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<View> {
    Ok(match state.services.book_instances.update(id, &form).await? {
        FormOutcome::Saved(instance) | FormOutcome::Existing(instance) => {
            View::redirect(instance.url())
        }
        FormOutcome::Invalid { form, errors } => View::render_errors(
            "bookinstance_form",
            "Update BookInstance",
            form_context(&form),
            &errors,
        ),
    })
}
