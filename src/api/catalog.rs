//! Catalog home page

use axum::extract::State;
use serde_json::json;

use super::view::View;
use crate::AppState;

/// Home page with entity counts. A failed count is shown on the page rather
/// than turned into an error response.
pub async fn index(State(state): State<AppState>) -> View {
    let (data, error) = match state.services.catalog.counts().await {
        Ok(counts) => (json!(counts), None),
        Err(e) => {
            tracing::error!("catalog counts failed: {}", e);
            (json!({}), Some(e.to_string()))
        }
    };
    View::render(
        "index",
        "Local Library Home",
        json!({ "data": data, "error": error }),
    )
}
