//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

// Re-export commonly used types
pub use author::{Author, AuthorFields, AuthorForm};
pub use book::{Book, BookDraft, BookFields, BookForm, GenreSelection};
pub use book_instance::{BookInstance, BookInstanceDraft, BookInstanceFields, BookInstanceForm, BookStatus};
pub use genre::{Genre, GenreFields, GenreForm};

/// The four kinds of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Author,
    Genre,
    Book,
    BookInstance,
}

impl EntityKind {
    /// Path segment used in catalog URLs (`/catalog/<segment>/<id>`)
    pub fn path_segment(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Genre => "genre",
            EntityKind::Book => "book",
            EntityKind::BookInstance => "bookinstance",
        }
    }

    /// Path of the list page for this kind
    pub fn list_path(&self) -> String {
        format!("/catalog/{}s", self.path_segment())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntityKind::Author => "Author",
            EntityKind::Genre => "Genre",
            EntityKind::Book => "Book",
            EntityKind::BookInstance => "Book copy",
        };
        write!(f, "{}", label)
    }
}

/// Resource path of a single entity
pub fn resource_path(kind: EntityKind, id: uuid::Uuid) -> String {
    format!("/catalog/{}/{}", kind.path_segment(), id)
}

/// Long display form, e.g. "June 3rd, 1965". Empty when absent.
pub fn format_long_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("{} {}, {}", d.format("%B"), ordinal(d.day()), d.year()),
        None => String::new(),
    }
}

/// ISO form used to prefill date inputs. Empty when absent.
pub fn format_iso_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}
