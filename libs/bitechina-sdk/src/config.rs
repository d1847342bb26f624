use url::Url;

use crate::error::SdkError;

/// Content API base used when none is configured.
pub const DEFAULT_CONTENT_API_BASE: &str = "http://localhost:3000/api/v1";

/// IP geolocation endpoint used by the locale resolver.
pub const DEFAULT_GEO_LOOKUP_URL: &str = "https://ipapi.co/json/";

/// Configuration for the SDK clients.
#[derive(Debug, Clone, Default)]
pub struct SdkConfig {
    /// Content and profile API base (default: `http://localhost:3000/api/v1`)
    pub content_api_base: Option<String>,

    /// Subscription backend origin, e.g. `https://api.bitechina.com`
    pub backend_base: String,

    /// Supabase project URL, e.g. `https://abcd.supabase.co`
    pub supabase_url: String,

    /// Supabase publishable (anon) key
    pub supabase_anon_key: String,

    /// Geolocation endpoint (default: `https://ipapi.co/json/`)
    pub geo_lookup_url: Option<String>,
}

impl SdkConfig {
    /// Checks required fields and URL syntax.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.supabase_anon_key.trim().is_empty() {
            return Err(SdkError::Config("supabase_anon_key is required".into()));
        }
        parse_base("backend_base", &self.backend_base)?;
        parse_base("supabase_url", &self.supabase_url)?;
        parse_base("content_api_base", &self.content_api_base())?;
        parse_base("geo_lookup_url", self.geo_lookup_url())?;
        Ok(())
    }

    /// Content API base without a trailing slash.
    pub fn content_api_base(&self) -> String {
        trim_base(
            self.content_api_base
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or(DEFAULT_CONTENT_API_BASE),
        )
    }

    pub fn backend_base(&self) -> String {
        trim_base(&self.backend_base)
    }

    pub fn supabase_url(&self) -> String {
        trim_base(&self.supabase_url)
    }

    pub fn geo_lookup_url(&self) -> &str {
        self.geo_lookup_url
            .as_deref()
            .unwrap_or(DEFAULT_GEO_LOOKUP_URL)
    }

    /// Local storage prefix the auth provider writes its keys under
    /// (`sb-<project ref>-...`).
    pub fn storage_key(&self) -> String {
        let project_ref = Url::parse(&self.supabase_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.split('.').next().unwrap_or(h).to_string()))
            .unwrap_or_else(|| "local".to_string());
        format!("sb-{}-auth-token", project_ref)
    }
}

fn trim_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn parse_base(field: &str, value: &str) -> Result<Url, SdkError> {
    if value.trim().is_empty() {
        return Err(SdkError::Config(format!("{field} is required")));
    }
    Url::parse(value.trim()).map_err(|e| SdkError::Config(format!("{field} is not a valid URL: {e}")))
}
