//! Display language resolution from IP geolocation and explicit user choice.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bitechina_types::Language;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::error::SdkError;

#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Two-letter country code of the caller, if the service knows it.
    async fn country_code(&self) -> Result<Option<String>, SdkError>;
}

#[cfg(feature = "client")]
pub use ip_api::IpApiLookup;

#[cfg(feature = "client")]
mod ip_api {
    use super::*;
    use serde::Deserialize;

    use crate::config::SdkConfig;

    #[derive(Debug, Clone)]
    pub struct IpApiLookup {
        endpoint: String,
        http_client: reqwest::Client,
    }

    #[derive(Deserialize)]
    struct GeoResponse {
        #[serde(default)]
        country_code: Option<String>,
    }

    impl IpApiLookup {
        pub fn new(config: &SdkConfig) -> Self {
            Self::with_endpoint(config.geo_lookup_url())
        }

        pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
            Self {
                endpoint: endpoint.into(),
                http_client: reqwest::Client::new(),
            }
        }
    }

    #[async_trait]
    impl GeoLookup for IpApiLookup {
        async fn country_code(&self) -> Result<Option<String>, SdkError> {
            let response = self.http_client.get(&self.endpoint).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SdkError::Api {
                    status: status.as_u16(),
                    message: "Geolocation lookup failed".into(),
                });
            }
            let body: GeoResponse = response.json().await?;
            Ok(body
                .country_code
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocaleState {
    pub language: Language,
    pub country_code: Option<[u8; 2]>,
}

impl LocaleState {
    pub fn country_code(&self) -> Option<&str> {
        self.country_code
            .as_ref()
            .and_then(|c| std::str::from_utf8(c).ok())
    }
}

fn pack_country(code: &str) -> Option<[u8; 2]> {
    match code.as_bytes() {
        [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
            Some([a.to_ascii_uppercase(), b.to_ascii_uppercase()])
        }
        _ => None,
    }
}

struct Inner {
    geo: Arc<dyn GeoLookup>,
    state: watch::Sender<LocaleState>,
    user_selected: AtomicBool,
    alive: AtomicBool,
    detection: Mutex<Option<JoinHandle<()>>>,
}

/// Resolves the display language: Korean for visitors geolocated in KR,
/// English otherwise, unless the user picked a language explicitly.
#[derive(Clone)]
pub struct LocaleResolver {
    inner: Arc<Inner>,
}

impl LocaleResolver {
    pub fn new(geo: Arc<dyn GeoLookup>) -> Self {
        let (state, _) = watch::channel(LocaleState::default());
        Self {
            inner: Arc::new(Inner {
                geo,
                state,
                user_selected: AtomicBool::new(false),
                alive: AtomicBool::new(true),
                detection: Mutex::new(None),
            }),
        }
    }

    /// Spawns detection in the background.
    pub fn start(&self) {
        let resolver = self.clone();
        let handle = tokio::spawn(async move { resolver.detect().await });
        if let Ok(mut detection) = self.inner.detection.lock() {
            *detection = Some(handle);
        }
    }

    /// Looks the country up once and applies the result, unless torn down meanwhile.
    pub async fn detect(&self) {
        let result = self.inner.geo.country_code().await;
        if !self.inner.alive.load(Ordering::SeqCst) {
            debug!("Locale resolver torn down, discarding geolocation result");
            return;
        }

        let country = match result {
            Ok(code) => code.as_deref().and_then(pack_country),
            Err(e) => {
                debug!(error = %e, "Geolocation lookup failed");
                None
            }
        };
        self.inner.state.send_modify(|state| {
            state.country_code = country;
            // Read under the state lock so a concurrent set_language wins.
            let user_selected = self.inner.user_selected.load(Ordering::SeqCst);
            if !user_selected && country.is_some() {
                let code = state.country_code();
                state.language = Language::for_country(code);
            }
        });
        let state = *self.inner.state.borrow();
        info!(
            country = state.country_code().unwrap_or("unknown"),
            language = state.language.as_str(),
            "Locale resolved"
        );
    }

    /// Explicit choice. Sticks for the lifetime of this resolver.
    pub fn set_language(&self, language: Language) {
        self.inner.user_selected.store(true, Ordering::SeqCst);
        self.inner.state.send_modify(|state| state.language = language);
    }

    pub fn language(&self) -> Language {
        self.inner.state.borrow().language
    }

    pub fn state(&self) -> LocaleState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocaleState> {
        self.inner.state.subscribe()
    }

    pub fn teardown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        if let Ok(mut detection) = self.inner.detection.lock() {
            if let Some(handle) = detection.take() {
                handle.abort();
            }
        }
    }
}
