//! Genre model and related types

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{resource_path, EntityKind};
use crate::validation::{sanitize, ErrorCollector, Validated};

pub const NAME_MAX_LEN: usize = 100;

const FIELDS: &[&str] = &["name"];

/// Stored genre document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn from_fields(id: Uuid, fields: GenreFields) -> Self {
        Self {
            id,
            name: fields.name,
        }
    }

    pub fn url(&self) -> String {
        resource_path(EntityKind::Genre, self.id)
    }
}

/// Genre as handed to views
#[derive(Debug, Clone, Serialize)]
pub struct GenreResource {
    #[serde(flatten)]
    pub genre: Genre,
    pub url: String,
}

impl From<&Genre> for GenreResource {
    fn from(genre: &Genre) -> Self {
        Self {
            url: genre.url(),
            genre: genre.clone(),
        }
    }
}

/// Validated genre fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreFields {
    pub name: String,
}

impl GenreFields {
    /// Key used for the uniqueness check on create and update
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Case-folded name; two genres with the same key are the same genre.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Raw genre form input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Validate)]
struct GenreRules {
    #[validate(length(min = 1, message = "Genre name required"))]
    name: String,
}

impl GenreForm {
    pub fn validate(&self) -> Validated<GenreFields> {
        let rules = GenreRules {
            name: self.name.trim().to_string(),
        };
        let mut errors = ErrorCollector::from_result(rules.validate(), FIELDS);
        errors.check(
            "name",
            rules.name.chars().count() <= NAME_MAX_LEN,
            "Genre name must not exceed 100 characters",
        );

        let fields = GenreFields {
            name: sanitize(&self.name),
        };
        if errors.is_empty() {
            Validated::Clean(fields)
        } else {
            Validated::Rejected {
                draft: fields,
                errors: errors.into_ordered(FIELDS),
            }
        }
    }
}
