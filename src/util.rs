/// Strip markdown code fences the model sometimes wraps its JSON in.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Slice out the outermost `{ ... }` span, if any.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

/// Preview a secret for logs without exposing it.
pub fn redact(secret: &str) -> String {
    let n = secret.chars().take(4).map(char::len_utf8).sum::<usize>();
    format!("{}...({} chars)", &secret[..n], secret.chars().count())
}
