const INDEX_TEMPLATE: &str = include_str!("index.html");
const API_BASE_TOKEN: &str = "{{api_base}}";
const LOOKUP_DETAIL_TOKEN: &str = "{{lookup_detail}}";
const POLL_INTERVAL_TOKEN: &str = "{{poll_interval_ms}}";
const CACHE_BUST_TOKEN: &str = "{{cache_bust}}";
const INITIAL_SCRIPT_TOKEN: &str = "{{initial_script}}";

pub struct IndexParams<'a> {
    pub api_base: &'a str,
    pub lookup_detail: &'a str,
    pub poll_interval_ms: u64,
    pub cache_bust: &'a str,
}

/// `initial_payload` must already be safe to embed in a `<script>` element.
pub fn render_index(params: &IndexParams<'_>, initial_payload: Option<&str>) -> String {
    let initial_script = initial_payload
        .map(|payload| {
            format!(
                r#"    <script id="initial-data" type="application/json">{}</script>"#,
                payload
            )
        })
        .unwrap_or_default();

    INDEX_TEMPLATE
        .replace(API_BASE_TOKEN, &escape_attr(params.api_base))
        .replace(LOOKUP_DETAIL_TOKEN, &escape_attr(params.lookup_detail))
        .replace(POLL_INTERVAL_TOKEN, &params.poll_interval_ms.to_string())
        .replace(CACHE_BUST_TOKEN, &escape_attr(params.cache_bust))
        .replace(INITIAL_SCRIPT_TOKEN, &initial_script)
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
