//! Text helpers shared by prompt building and diagnostics.

/// The first `max_chars` characters of `text`.
pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shorten `text` for logs: newlines flattened, middle elided past `max_chars`.
pub fn elide_middle(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let total = flat.chars().count();
    if total <= max_chars {
        return flat;
    }
    let half = max_chars / 2;
    let prefix: String = flat.chars().take(half).collect();
    let suffix: String = flat.chars().skip(total - half).collect();
    format!("{} ... [{} chars elided] ... {}", prefix, total - 2 * half, suffix)
}

/// Markdown bullet list, or `empty` when there is nothing to list.
pub fn bullets(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-joined list, or `empty` when there is nothing to list.
pub fn joined_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}
