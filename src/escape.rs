/// Escape text for insertion into HTML markup.
///
/// Ampersands are replaced first so the entities produced by the later
/// replacements are left alone. Apply exactly once per raw string.
pub fn escape_html(unsafe_text: &str) -> String {
    unsafe_text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
