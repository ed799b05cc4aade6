//! Presentation responses.
//!
//! A page is rendered as a JSON document `{ "view", "title", ...context }`;
//! navigation after a successful mutation is a `303 See Other`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::validation::FieldError;

#[derive(Debug)]
pub enum View {
    Render {
        view: &'static str,
        title: String,
        context: Map<String, Value>,
    },
    Redirect(String),
}

impl View {
    /// Render `view` with the given context. Non-object contexts are placed
    /// under a `data` key.
    pub fn render(view: &'static str, title: impl Into<String>, context: Value) -> Self {
        let context = match context {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        View::Render {
            view,
            title: title.into(),
            context,
        }
    }

    /// Render a form again with its field errors
    pub fn render_errors(
        view: &'static str,
        title: impl Into<String>,
        context: Value,
        errors: &[FieldError],
    ) -> Self {
        let mut rendered = Self::render(view, title, context);
        if let View::Render { context, .. } = &mut rendered {
            context.insert("errors".to_string(), serde_json::json!(errors));
        }
        rendered
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        View::Redirect(path.into())
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        match self {
            View::Render {
                view,
                title,
                mut context,
            } => {
                context.insert("view".to_string(), Value::from(view));
                context.insert("title".to_string(), Value::from(title));
                (StatusCode::OK, Json(Value::Object(context))).into_response()
            }
            View::Redirect(path) => Redirect::to(&path).into_response(),
        }
    }
}
