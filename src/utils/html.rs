use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Discussion posts and replies accept rich text from users; this strips
/// dangerous tags (<script>, <iframe>) and attributes (onclick) while keeping
/// safe formatting tags, so stored content is safe to render in any client.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
