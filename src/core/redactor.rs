//! Token masking for display and logs

/// Mask a token for display
///
/// Long tokens keep their first and last 4 chars, mid-length ones only the
/// first 4. Anything shorter than 9 chars is masked completely.
pub fn mask_token(token: &str) -> String {
    let trimmed = token.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        format!("{}...", head)
    } else if chars.is_empty() {
        String::new()
    } else {
        "****".to_string()
    }
}
