//! Text rendering in the layout `terraform fmt` produces.

use crate::body::{Body, Expression, Item};
use crate::value::Value;

const INDENT: &str = "  ";

/// Render a body at the given nesting depth.
pub fn render_body(body: &Body, depth: usize) -> String {
    let mut out = String::new();
    let pad = INDENT.repeat(depth);
    let items = body.items();

    let mut i = 0;
    while i < items.len() {
        match &items[i] {
            Item::Attribute { .. } | Item::Object { .. } => {
                // Consecutive assignments share one alignment column; a value
                // spanning several lines closes the run.
                let run_end = alignment_run_end(items, i, depth);

                let width = items[i..run_end]
                    .iter()
                    .filter_map(|item| match item {
                        Item::Attribute { name, .. } | Item::Object { name, .. } => Some(name.len()),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(0);

                for item in &items[i..run_end] {
                    match item {
                        Item::Attribute { name, expr } => out.push_str(&format!(
                            "{}{:<width$} = {}\n",
                            pad,
                            name,
                            render_expression(expr, depth),
                            width = width
                        )),
                        Item::Object { name, body } => {
                            out.push_str(&format!("{}{:<width$} = {{\n", pad, name, width = width));
                            out.push_str(&render_body(body, depth + 1));
                            out.push_str(&format!("{}}}\n", pad));
                        }
                        _ => {}
                    }
                }
                i = run_end;
                continue;
            }
            Item::Block(block) => {
                out.push_str(&pad);
                out.push_str(&block.kind);
                for label in &block.labels {
                    out.push_str(&format!(" \"{}\"", escape_string(label)));
                }
                out.push_str(" {\n");
                out.push_str(&render_body(&block.body, depth + 1));
                out.push_str(&format!("{}}}\n", pad));
            }
            Item::Newline => out.push('\n'),
        }
        i += 1;
    }

    out
}

fn alignment_run_end(items: &[Item], start: usize, depth: usize) -> usize {
    let mut end = start;
    while end < items.len() {
        match &items[end] {
            Item::Attribute { expr, .. } => {
                end += 1;
                if render_expression(expr, depth).contains('\n') {
                    break;
                }
            }
            Item::Object { .. } => {
                end += 1;
                break;
            }
            _ => break,
        }
    }
    end
}

fn render_expression(expr: &Expression, depth: usize) -> String {
    match expr {
        Expression::Raw(raw) => raw.clone(),
        Expression::Value(value) => render_value(value, depth),
    }
}

/// Render a literal value. Non-empty objects are laid out over several lines
/// with their closing brace at `depth`.
pub fn render_value(value: &Value, depth: usize) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(render_inline).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let pad = INDENT.repeat(depth);
            let inner = INDENT.repeat(depth + 1);
            let width = map.keys().map(|k| render_key(k).len()).max().unwrap_or(0);

            let mut out = String::from("{\n");
            for (key, val) in map {
                out.push_str(&format!(
                    "{}{:<width$} = {}\n",
                    inner,
                    render_key(key),
                    render_value(val, depth + 1),
                    width = width
                ));
            }
            out.push_str(&pad);
            out.push('}');
            out
        }
    }
}

fn render_inline(value: &Value) -> String {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} = {}", render_key(k), render_inline(v)))
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        }
        other => render_value(other, 0),
    }
}

fn render_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if bare {
        key.to_string()
    } else {
        format!("\"{}\"", escape_string(key))
    }
}

/// Escape a string for use inside an HCL quoted template.
///
/// Template introducers are doubled so the text is taken literally.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            other => out.push(other),
        }
    }

    out
}
