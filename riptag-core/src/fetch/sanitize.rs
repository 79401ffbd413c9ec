/// Make a display name safe to use as a file name.
///
/// Path separators and the characters Windows rejects become `-`; double
/// quotes become single quotes. Applying it twice changes nothing.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|' => '-',
            '"' => '\'',
            other => other,
        })
        .collect()
}
