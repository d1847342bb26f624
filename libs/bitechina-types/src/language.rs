use serde::{Deserialize, Serialize};

/// Display language of the site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    #[default]
    En,
}

impl Language {
    /// Parses a locale hint such as `ko`, `ko-KR` or an `Accept-Language` list.
    /// Anything that is not Korean is English.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let candidate = raw
            .unwrap_or("en")
            .split(',')
            .next()
            .unwrap_or("en")
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .trim()
            .to_lowercase();
        match candidate.as_str() {
            "ko" => Language::Ko,
            _ => Language::En,
        }
    }

    /// Language implied by a two-letter country code.
    pub fn for_country(country_code: Option<&str>) -> Self {
        match country_code {
            Some(code) if code.eq_ignore_ascii_case("KR") => Language::Ko,
            _ => Language::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}
