use axum::response::Html;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const RESULT_SLOT: &str = "{{ result }}";

pub fn render_page(prediction: Option<&str>, image: Option<&str>) -> Html<String> {
    let mut result = String::new();
    if let Some(prediction) = prediction {
        result.push_str("  <div class=\"result\">\n");
        result.push_str(&format!(
            "    <h2>Prediction: <span id=\"prediction\">{}</span></h2>\n",
            escape_html(prediction)
        ));
        if let Some(image) = image {
            result.push_str(&format!(
                "    <img id=\"uploaded\" src=\"{}\" alt=\"Uploaded image\">\n",
                escape_html(image)
            ));
        }
        result.push_str("  </div>");
    }

    Html(INDEX_TEMPLATE.replace(RESULT_SLOT, &result))
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
