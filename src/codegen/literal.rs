//! String literals embedded in generated statements

use serde_json::Value;

/// Escape text for a JavaScript template literal.
///
/// Uses JSON string escaping, then escapes `` ` `` and `${` so the literal can
/// neither terminate early nor interpolate.
pub fn escape_text(text: &str) -> String {
    let json = Value::String(text.to_string()).to_string();
    let inner = json
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(&json);
    inner.replace('`', "\\`").replace("${", "\\${")
}

/// Wrap text in backticks after escaping it
pub fn quote(text: &str) -> String {
    format!("`{}`", escape_text(text))
}

/// Render a string list as a JSON array with `", "` separators
pub fn json_string_list(items: &[String]) -> String {
    let parts: Vec<String> = items.iter().map(|item| Value::String(item.clone()).to_string()).collect();
    format!("[{}]", parts.join(", "))
}
