use crate::presentation::render_page;
use axum::response::Html;

pub async fn index() -> Html<String> {
    render_page(None, None)
}
