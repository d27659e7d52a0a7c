use url::Url;

/// True when the URL carries a `list` query parameter.
pub fn is_playlist_url(raw: &str) -> bool {
    playlist_id(raw).is_some()
}

fn playlist_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    parsed
        .query_pairs()
        .find(|(key, value)| key == "list" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Rewrite a playlist reference into the canonical
/// `https://www.youtube.com/playlist?list=<id>` form.
///
/// URLs already at `/playlist`, and URLs without a `list` parameter, are
/// returned unchanged.
pub fn normalize_playlist_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return raw.to_string();
    };
    if parsed.path() == "/playlist" {
        return raw.to_string();
    }

    match playlist_id(raw) {
        Some(id) => format!("https://www.youtube.com/playlist?list={}", id),
        None => raw.to_string(),
    }
}
