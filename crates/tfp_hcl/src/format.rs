//! Helpers for building raw expressions.

use crate::render::escape_string;

/// Render a list of strings as a raw HCL tuple expression: `["a", "b"]`.
pub fn list_of_strings<S: AsRef<str>>(values: &[S]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", escape_string(v.as_ref())))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Join traversal steps with `.`: `traversal(&["aws_instance", "server", "id"])`.
pub fn traversal(parts: &[&str]) -> String {
    parts.join(".")
}
