//! YouTube source URL parsing.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// youtu.be links, and youtube.com / youtube-nocookie.com links where the id
/// follows a separator (`watch?v=`, `/embed/`, `/v/`, ...).
static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*https?://(?:[0-9a-z-]+\.)?(?:youtu\.be/|youtube(?:-nocookie)?\.com\S*[^A-Za-z0-9_\s-])([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-].*)?$",
    )
    .expect("video URL pattern is valid")
});

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid"));

/// Extract the video id from a YouTube URL.
///
/// Anything that is not a recognised YouTube URL is returned unchanged, so a
/// bare id passes straight through.
pub fn extract_video_id(src: &str) -> String {
    VIDEO_URL_RE
        .captures(src)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| src.to_string(), |m| m.as_str().to_string())
}

/// Whether `value` is a well-formed 11 character video id.
pub fn is_video_id(value: &str) -> bool {
    VIDEO_ID_RE.is_match(value)
}

/// Parse the query string of `src` into an ordered map.
///
/// A parameter without `=` maps to the empty string. Values are decoded with
/// `+` as space; a malformed escape leaves the raw value.
pub fn parse_query_params(src: &str) -> IndexMap<String, String> {
    let mut params = IndexMap::new();
    let Some((_, query)) = src.split_once('?') else {
        return params;
    };

    for item in query.split('&').filter(|item| !item.is_empty()) {
        let (key, value) = match item.split_once('=') {
            Some((key, value)) => (key, decode_component(value)),
            None => (item, String::new()),
        };
        params.insert(key.to_string(), value);
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => spaced,
    }
}
