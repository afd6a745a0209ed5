/// Hard character budget shared by the text-only networks
pub const POST_CHAR_LIMIT: usize = 140;

/// Fixed reserved URL width for networks without a live shortener config
pub const FIXED_SHORT_URL_LEN: usize = 25;

/// Truncate to the last char boundary at or below `max` bytes.
/// Raw slicing would panic mid-codepoint on multi-byte text.
pub fn clip(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut end = max;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

/// Status policy: content that fits the budget is returned unchanged;
/// otherwise the URL is anchored as for a link.
pub fn compose_status(content: &str, url: &str, max: usize, reserved: usize) -> String {
    if content.len() <= max {
        return content.to_string();
    }
    compose_with_url(content, url, max, reserved)
}

/// Link policy: the URL always rides along. The shortener consumes
/// `reserved` characters plus one for the separating space, so the content
/// keeps at most `max - (reserved + 1)` of its own.
pub fn compose_with_url(content: &str, url: &str, max: usize, reserved: usize) -> String {
    let budget = max.saturating_sub(reserved + 1);
    if content.len() <= budget {
        return format!("{} {}", content, url);
    }
    format!("{} {}", clip(content, budget), url)
}
