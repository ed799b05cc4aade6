//! Book model and related types

use std::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use uuid::Uuid;
use validator::Validate;

use super::{resource_path, EntityKind};
use crate::validation::{parse_reference, sanitize, ErrorCollector, Validated};

const FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre"];

/// Stored book document. `author` and `genre` are references, never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl Book {
    pub fn from_fields(id: Uuid, fields: BookFields) -> Self {
        Self {
            id,
            title: fields.title,
            author: fields.author,
            summary: fields.summary,
            isbn: fields.isbn,
            genre: fields.genre,
        }
    }

    pub fn url(&self) -> String {
        resource_path(EntityKind::Book, self.id)
    }

    pub fn has_genre(&self, genre_id: Uuid) -> bool {
        self.genre.contains(&genre_id)
    }

    pub fn draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: Some(self.author),
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            genre: self.genre.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookResource {
    #[serde(flatten)]
    pub book: Book,
    pub url: String,
}

impl From<&Book> for BookResource {
    fn from(book: &Book) -> Self {
        Self {
            url: book.url(),
            book: book.clone(),
        }
    }
}

/// Validated book fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookFields {
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

/// Best-effort book candidate used to redisplay a rejected form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookDraft {
    pub title: String,
    pub author: Option<Uuid>,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl From<BookFields> for BookDraft {
    fn from(fields: BookFields) -> Self {
        Self {
            title: fields.title,
            author: Some(fields.author),
            summary: fields.summary,
            isbn: fields.isbn,
            genre: fields.genre,
        }
    }
}

/// Genre ids picked on a book form.
///
/// Forms send nothing, one value or repeated values for the same key; all three
/// arrive here as a plain list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenreSelection(pub Vec<String>);

impl GenreSelection {
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

impl<'de> Deserialize<'de> for GenreSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = GenreSelection;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a genre id or a list of genre ids")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(GenreSelection(vec![v.to_string()]))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(GenreSelection(vec![v]))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(GenreSelection::default())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(GenreSelection::default())
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut ids = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(id) = seq.next_element::<String>()? {
                    ids.push(id);
                }
                Ok(GenreSelection(ids))
            }
        }

        deserializer.deserialize_any(SelectionVisitor)
    }
}

/// Raw book form input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub genre: GenreSelection,
}

#[derive(Debug, Validate)]
struct BookRules {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    author: String,
    #[validate(length(min = 1, message = "Summary must not be empty"))]
    summary: String,
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    isbn: String,
}

impl BookForm {
    pub fn validate(&self) -> Validated<BookFields, BookDraft> {
        let rules = BookRules {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            summary: self.summary.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
        };
        let mut errors = ErrorCollector::from_result(rules.validate(), FIELDS);

        let author = parse_reference(&rules.author);
        if !errors.has("author") {
            errors.check("author", author.is_some(), "Invalid author");
        }

        let mut genre = Vec::new();
        for raw in self.genre.ids() {
            match parse_reference(raw) {
                Some(id) if !genre.contains(&id) => genre.push(id),
                Some(_) => {}
                None => errors.check("genre", false, "Invalid genre"),
            }
        }

        let draft = BookDraft {
            title: sanitize(&self.title),
            author,
            summary: sanitize(&self.summary),
            isbn: sanitize(&self.isbn),
            genre,
        };

        match (errors.is_empty(), draft.author) {
            (true, Some(author)) => Validated::Clean(BookFields {
                title: draft.title,
                author,
                summary: draft.summary,
                isbn: draft.isbn,
                genre: draft.genre,
            }),
            _ => Validated::Rejected {
                draft,
                errors: errors.into_ordered(FIELDS),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_form() -> BookForm {
        BookForm {
            title: "The Name of the Wind".into(),
            author: Uuid::new_v4().to_string(),
            summary: "A story.".into(),
            isbn: "9781473211896".into(),
            genre: GenreSelection::default(),
        }
    }

    #[test]
    fn test_genre_selection_shapes() {
        let id = Uuid::new_v4().to_string();

        let absent: BookForm = serde_json::from_value(json!({ "title": "T" })).unwrap();
        assert!(absent.genre.0.is_empty());

        let single: BookForm = serde_json::from_value(json!({ "genre": id.clone() })).unwrap();
        assert_eq!(single.genre.0, vec![id.clone()]);

        let many: BookForm = serde_json::from_value(json!({ "genre": [id.clone(), id] })).unwrap();
        assert_eq!(many.genre.0.len(), 2);

        let null: BookForm = serde_json::from_value(json!({ "genre": null })).unwrap();
        assert!(null.genre.0.is_empty());
    }

    #[test]
    fn test_absent_genre_is_empty_not_error() {
        match valid_form().validate() {
            Validated::Clean(fields) => assert!(fields.genre.is_empty()),
            Validated::Rejected { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn test_duplicate_genres_collapse() {
        let id = Uuid::new_v4();
        let mut form = valid_form();
        form.genre = GenreSelection(vec![id.to_string(), format!(" {} ", id), String::new()]);
        match form.validate() {
            Validated::Clean(fields) => assert_eq!(fields.genre, vec![id]),
            Validated::Rejected { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn test_all_required_fields_empty() {
        let result = BookForm::default().validate();
        let messages: Vec<_> = result.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Title must not be empty",
                "Author must not be empty",
                "Summary must not be empty",
                "ISBN must not be empty",
            ]
        );
    }

    #[test]
    fn test_bad_references() {
        let mut form = valid_form();
        form.author = "not-an-id".into();
        form.genre = GenreSelection(vec!["nope".into()]);
        match form.validate() {
            Validated::Rejected { draft, errors } => {
                assert_eq!(draft.author, None);
                assert_eq!(errors[0], crate::validation::FieldError::new("author", "Invalid author"));
                assert_eq!(errors[1], crate::validation::FieldError::new("genre", "Invalid genre"));
            }
            Validated::Clean(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_text_fields_sanitized() {
        let mut form = valid_form();
        form.summary = "  <script>alert(1)</script> ".into();
        match form.validate() {
            Validated::Clean(fields) => {
                assert!(fields.summary.starts_with("&lt;script&gt;"));
            }
            Validated::Rejected { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }
}
