pub const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results?search_query=";

/// YouTube search link for `query`; spaces become `+`.
pub fn search_link(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return YOUTUBE_SEARCH_URL.to_string();
    }
    format!("{}{}", YOUTUBE_SEARCH_URL, query.replace(' ', "+"))
}
