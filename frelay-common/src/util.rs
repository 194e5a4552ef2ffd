//! Shared utilities for frelay.

/// Length of the value that follows a secret marker: up to the next
/// whitespace, comma or quote-balanced boundary.
fn find_value_end(s: &str) -> usize {
    let mut end = 0;
    let mut in_quote = None;

    for c in s.chars() {
        if let Some(q) = in_quote {
            if c == q {
                in_quote = None;
            }
            end += c.len_utf8();
            continue;
        }

        if c == '"' || c == '\'' {
            in_quote = Some(c);
            end += c.len_utf8();
            continue;
        }

        if c.is_whitespace() || c == ',' || c == '&' {
            break;
        }

        end += c.len_utf8();
    }
    end
}

/// Mask credential-looking values in free text before logging or
/// forwarding it to an operator (e.g. an HTTP error body).
pub fn mask_sensitive_text(text: &str) -> String {
    let patterns = [
        ("Bearer ", "Bearer ***"),
        ("password=", "password=***"),
        ("PASSWORD=", "PASSWORD=***"),
        ("api_key=", "api_key=***"),
        ("API_KEY=", "API_KEY=***"),
        ("token=", "token=***"),
        ("\"apiKey\":", "\"apiKey\":***"),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        let mut search_start = 0;
        while search_start < result.len() {
            let Some(start) = result[search_start..].find(pattern) else {
                break;
            };
            let abs_start = search_start + start;
            let value_start = abs_start + pattern.len();
            let value_end = value_start + find_value_end(&result[value_start..]);

            result = format!(
                "{}{}{}",
                &result[..abs_start],
                replacement,
                &result[value_end..]
            );
            search_start = abs_start + replacement.len();
        }
    }
    result
}

/// Render a secret for diagnostics without revealing it.
pub fn mask_secret(secret: &str) -> String {
    match secret.chars().count() {
        0 => String::new(),
        1..=6 => "***".to_string(),
        _ => {
            let head: String = secret.chars().take(2).collect();
            format!("{}***", head)
        }
    }
}

/// Join a remote directory and a file name with exactly one `/`.
pub fn remote_join(dir: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        return name.to_string();
    }
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Shorten long text (e.g. a response body) for messages.
pub fn truncate_for_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}... [truncated]", head)
}
