/// Collapse whitespace runs to a single space, trim, and lowercase.
///
/// Applied to every query before it reaches the encoder.
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
