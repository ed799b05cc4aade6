//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{format_iso_date, format_long_date, resource_path, EntityKind};
use crate::validation::{parse_optional_date, sanitize, ErrorCollector, Validated, LETTERS_ONLY};

pub const NAME_MAX_LEN: usize = 100;

const FIELDS: &[&str] = &["first_name", "family_name", "date_of_birth", "date_of_death"];

/// Stored author document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    pub fn from_fields(id: Uuid, fields: AuthorFields) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            family_name: fields.family_name,
            date_of_birth: fields.date_of_birth,
            date_of_death: fields.date_of_death,
        }
    }

    /// "family_name, first_name"
    pub fn name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn url(&self) -> String {
        resource_path(EntityKind::Author, self.id)
    }

    pub fn date_of_birth_formatted(&self) -> String {
        format_long_date(self.date_of_birth)
    }

    pub fn date_of_death_formatted(&self) -> String {
        format_long_date(self.date_of_death)
    }

    /// "<birth> - <death>", either side empty when unknown
    pub fn lifespan(&self) -> String {
        format!(
            "{} - {}",
            self.date_of_birth_formatted(),
            self.date_of_death_formatted()
        )
    }

    pub fn fields(&self) -> AuthorFields {
        AuthorFields {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

/// Author as handed to views, with derived attributes
#[derive(Debug, Clone, Serialize)]
pub struct AuthorResource {
    #[serde(flatten)]
    pub author: Author,
    pub name: String,
    pub url: String,
    pub date_of_birth_formatted: String,
    pub date_of_death_formatted: String,
    pub date_of_birth_yyyy_mm_dd: String,
    pub date_of_death_yyyy_mm_dd: String,
    pub lifespan: String,
}

impl From<&Author> for AuthorResource {
    fn from(author: &Author) -> Self {
        Self {
            name: author.name(),
            url: author.url(),
            date_of_birth_formatted: author.date_of_birth_formatted(),
            date_of_death_formatted: author.date_of_death_formatted(),
            date_of_birth_yyyy_mm_dd: format_iso_date(author.date_of_birth),
            date_of_death_yyyy_mm_dd: format_iso_date(author.date_of_death),
            lifespan: author.lifespan(),
            author: author.clone(),
        }
    }
}

/// Validated author fields, ready for insert or update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorFields {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Raw author form input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub date_of_death: Option<String>,
}

#[derive(Debug, Validate)]
struct AuthorNameRules {
    #[validate(
        length(min = 1, message = "First name must be specified"),
        regex(path = *LETTERS_ONLY, message = "First name should only contain letters")
    )]
    first_name: String,
    #[validate(
        length(min = 1, message = "Family name must be specified"),
        regex(path = *LETTERS_ONLY, message = "Family name should only contain letters")
    )]
    family_name: String,
}

impl AuthorForm {
    /// Run the author rules over the trimmed input and sanitize every field.
    pub fn validate(&self) -> Validated<AuthorFields> {
        let rules = AuthorNameRules {
            first_name: self.first_name.trim().to_string(),
            family_name: self.family_name.trim().to_string(),
        };
        let mut errors = ErrorCollector::from_result(rules.validate(), FIELDS);

        errors.check(
            "first_name",
            rules.first_name.chars().count() <= NAME_MAX_LEN,
            "First name must not exceed 100 characters",
        );
        errors.check(
            "family_name",
            rules.family_name.chars().count() <= NAME_MAX_LEN,
            "Family name must not exceed 100 characters",
        );

        let date_of_birth = parse_optional_date(self.date_of_birth.as_deref());
        errors.check("date_of_birth", date_of_birth.is_ok(), "Invalid date of birth");
        let date_of_death = parse_optional_date(self.date_of_death.as_deref());
        errors.check("date_of_death", date_of_death.is_ok(), "Invalid date of death");

        let date_of_birth = date_of_birth.ok().flatten();
        let date_of_death = date_of_death.ok().flatten();
        if let (Some(born), Some(died)) = (date_of_birth, date_of_death) {
            errors.check(
                "date_of_death",
                died >= born,
                "Date of death must not be earlier than date of birth",
            );
        }

        let fields = AuthorFields {
            first_name: sanitize(&self.first_name),
            family_name: sanitize(&self.family_name),
            date_of_birth,
            date_of_death,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn form(first: &str, family: &str) -> AuthorForm {
        AuthorForm {
            first_name: first.to_string(),
            family_name: family.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_attributes() {
        let author = Author {
            id: Uuid::nil(),
            first_name: "Isaac".into(),
            family_name: "Asimov".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1920, 1, 2),
            date_of_death: NaiveDate::from_ymd_opt(1992, 4, 6),
        };
        assert_eq!(author.name(), "Asimov, Isaac");
        assert_eq!(author.url(), format!("/catalog/author/{}", Uuid::nil()));
        assert_eq!(author.lifespan(), "January 2nd, 1920 - April 6th, 1992");

        let resource = AuthorResource::from(&author);
        assert_eq!(resource.date_of_birth_yyyy_mm_dd, "1920-01-02");
    }

    #[test]
    fn test_lifespan_with_unknown_dates() {
        let author = Author::from_fields(Uuid::new_v4(), AuthorFields {
            first_name: "Ben".into(),
            family_name: "Bova".into(),
            ..Default::default()
        });
        assert_eq!(author.lifespan(), " - ");
    }

    #[test]
    fn test_valid_author() {
        let mut input = form("  Patrick ", "Rothfuss");
        input.date_of_birth = Some("1973-06-06".into());
        input.date_of_death = Some("".into());
        match input.validate() {
            Validated::Clean(fields) => {
                assert_eq!(fields.first_name, "Patrick");
                assert_eq!(fields.date_of_birth, NaiveDate::from_ymd_opt(1973, 6, 6));
                assert_eq!(fields.date_of_death, None);
            }
            Validated::Rejected { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn test_empty_names_give_one_message_each() {
        let result = form("  ", "").validate();
        let messages: Vec<_> = result.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["First name must be specified", "Family name must be specified"]
        );
    }

    #[test]
    fn test_non_letter_first_name() {
        let result = form("Mark1", "Twain").validate();
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].field, "first_name");
        assert_eq!(result.errors()[0].message, "First name should only contain letters");
    }

    #[test]
    fn test_name_too_long() {
        let result = form(&"a".repeat(101), "Twain").validate();
        assert_eq!(
            result.errors()[0].message,
            "First name must not exceed 100 characters"
        );
    }

    #[test]
    fn test_invalid_dates_keep_draft() {
        let mut input = form("Mark", "Twain");
        input.date_of_birth = Some("not a date".into());
        input.date_of_death = Some("1910-02-30".into());
        match input.validate() {
            Validated::Rejected { draft, errors } => {
                assert_eq!(draft.first_name, "Mark");
                assert_eq!(draft.date_of_birth, None);
                let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
                assert_eq!(messages, vec!["Invalid date of birth", "Invalid date of death"]);
            }
            Validated::Clean(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_death_before_birth_rejected() {
        let mut input = form("Mark", "Twain");
        input.date_of_birth = Some("1910-04-21".into());
        input.date_of_death = Some("1835-11-30".into());
        let result = input.validate();
        assert_eq!(
            result.errors()[0].message,
            "Date of death must not be earlier than date of birth"
        );
    }

    #[test]
    fn test_markup_is_escaped_even_when_rejected() {
        let result = form("<b>", "").validate();
        match result {
            Validated::Rejected { draft, .. } => {
                assert_eq!(draft.first_name, "&lt;b&gt;");
            }
            Validated::Clean(_) => panic!("expected rejection"),
        }
    }
}
