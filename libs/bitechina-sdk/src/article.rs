//! Article URL paths: `/{ko|en}/article/{id}/{slug}`.

use bitechina_types::Language;
use url::form_urlencoded::byte_serialize;

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c == '-'
        || c.is_whitespace()
        || ('\u{AC00}'..='\u{D7A3}').contains(&c)
        || ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// URL-safe slug for a title. Hangul and CJK ideographs are kept and
/// percent-encoded; everything else that is not a word character becomes a
/// separator.
pub fn slugify(title: Option<&str>, id: i64) -> String {
    let fallback = || format!("story-{}", id);
    let Some(trimmed) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return fallback();
    };

    let spaced: String = trimmed
        .chars()
        .map(|c| if is_slug_char(c) && c != '_' { c } else { ' ' })
        .collect();

    let mut sanitized = String::with_capacity(spaced.len());
    let mut pending_dash = false;
    for c in spaced.chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash {
            sanitized.push('-');
            pending_dash = false;
        }
        sanitized.push(c);
    }
    // Leading separators collapse into one dash at the front; drop it.
    let sanitized = sanitized.trim_start_matches('-');

    if sanitized.is_empty() {
        return fallback();
    }
    byte_serialize(sanitized.as_bytes()).collect()
}

pub fn build_article_path(
    id: i64,
    title: Option<&str>,
    title_en: Option<&str>,
    title_ko: Option<&str>,
    language: Language,
) -> String {
    let source = match language {
        Language::Ko => title_ko.or(title_en).or(title),
        Language::En => title_en.or(title_ko).or(title),
    };
    format!(
        "/{}/article/{}/{}",
        language.as_str(),
        id,
        slugify(source, id)
    )
}
