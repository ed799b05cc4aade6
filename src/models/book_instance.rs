//! Book instance (physical copy) model and related types

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{format_iso_date, format_long_date, resource_path, EntityKind};
use crate::validation::{parse_optional_date, parse_reference, sanitize, ErrorCollector, Validated};

const FIELDS: &[&str] = &["book", "imprint", "status", "due_back"];

/// Loan status of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookStatus {
    pub const ALL: [BookStatus; 4] = [
        BookStatus::Available,
        BookStatus::Maintenance,
        BookStatus::Loaned,
        BookStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Maintenance => "Maintenance",
            BookStatus::Loaned => "Loaned",
            BookStatus::Reserved => "Reserved",
        }
    }
}

impl FromStr for BookStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored copy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstance {
    pub id: Uuid,
    pub book: Uuid,
    pub imprint: String,
    pub status: BookStatus,
    pub due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub fn from_fields(id: Uuid, fields: BookInstanceFields) -> Self {
        Self {
            id,
            book: fields.book,
            imprint: fields.imprint,
            status: fields.status,
            due_back: fields.due_back,
        }
    }

    pub fn url(&self) -> String {
        resource_path(EntityKind::BookInstance, self.id)
    }

    pub fn due_back_formatted(&self) -> String {
        format_long_date(self.due_back)
    }

    pub fn draft(&self) -> BookInstanceDraft {
        BookInstanceDraft {
            book: Some(self.book),
            imprint: self.imprint.clone(),
            status: self.status,
            due_back: self.due_back,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceResource {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub url: String,
    pub due_back_formatted: String,
    pub due_back_yyyy_mm_dd: String,
}

impl From<&BookInstance> for BookInstanceResource {
    fn from(instance: &BookInstance) -> Self {
        Self {
            url: instance.url(),
            due_back_formatted: instance.due_back_formatted(),
            due_back_yyyy_mm_dd: format_iso_date(instance.due_back),
            instance: instance.clone(),
        }
    }
}

/// Validated copy fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstanceFields {
    pub book: Uuid,
    pub imprint: String,
    pub status: BookStatus,
    pub due_back: Option<NaiveDate>,
}

/// Best-effort copy candidate used to redisplay a rejected form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookInstanceDraft {
    pub book: Option<Uuid>,
    pub imprint: String,
    pub status: BookStatus,
    pub due_back: Option<NaiveDate>,
}

impl From<BookInstanceFields> for BookInstanceDraft {
    fn from(fields: BookInstanceFields) -> Self {
        Self {
            book: Some(fields.book),
            imprint: fields.imprint,
            status: fields.status,
            due_back: fields.due_back,
        }
    }
}

/// Raw copy form input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookInstanceForm {
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub imprint: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_back: Option<String>,
}

#[derive(Debug, Validate)]
struct BookInstanceRules {
    #[validate(length(min = 1, message = "Book must be specified"))]
    book: String,
    #[validate(length(min = 1, message = "Imprint must be specified"))]
    imprint: String,
}

impl BookInstanceForm {
    pub fn validate(&self) -> Validated<BookInstanceFields, BookInstanceDraft> {
        let rules = BookInstanceRules {
            book: self.book.trim().to_string(),
            imprint: self.imprint.trim().to_string(),
        };
        let mut errors = ErrorCollector::from_result(rules.validate(), FIELDS);

        let book = parse_reference(&rules.book);
        if !errors.has("book") {
            errors.check("book", book.is_some(), "Invalid book");
        }

        // A blank status falls back to the default.
        let status = match self.status.as_deref().map(sanitize) {
            None => Ok(BookStatus::default()),
            Some(s) if s.is_empty() => Ok(BookStatus::default()),
            Some(s) => s.parse::<BookStatus>(),
        };
        errors.check("status", status.is_ok(), "Invalid status");

        let due_back = parse_optional_date(self.due_back.as_deref());
        errors.check("due_back", due_back.is_ok(), "Invalid due back date");

        let draft = BookInstanceDraft {
            book,
            imprint: sanitize(&self.imprint),
            status: status.unwrap_or_default(),
            due_back: due_back.ok().flatten(),
        };

        match (errors.is_empty(), draft.book) {
            (true, Some(book)) => Validated::Clean(BookInstanceFields {
                book,
                imprint: draft.imprint,
                status: draft.status,
                due_back: draft.due_back,
            }),
            _ => Validated::Rejected {
                draft,
                errors: errors.into_ordered(FIELDS),
            },
        }
    }
}
