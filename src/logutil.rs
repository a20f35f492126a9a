//! Logging helpers for server-supplied text and credentials.
//! Server error bodies and slugs can contain control characters; tokens must never be logged whole.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///   Truncates long strings with an ellipsis; server error pages can be large.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Keep only a short prefix of a bearer token, enough to tell tokens apart in logs.
pub fn redact_token(token: &str) -> String {
    const VISIBLE: usize = 6;
    let visible: String = token.chars().take(VISIBLE).collect();
    if token.chars().count() <= VISIBLE {
        "***".to_string()
    } else {
        format!("{}***", visible)
    }
}
