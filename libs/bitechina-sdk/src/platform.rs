//! Browser-facing seams: persistent key/value storage and navigation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use url::Url;

pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// Removes every key starting with `prefix`. Returns how many were removed.
pub fn purge_prefixed(storage: &dyn LocalStorage, prefix: &str) -> usize {
    let doomed: Vec<String> = storage
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(prefix))
        .collect();
    for key in &doomed {
        storage.remove(key);
    }
    doomed.len()
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.remove(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.items
            .lock()
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default()
    }
}

pub trait Navigator: Send + Sync {
    fn current_url(&self) -> Url;
    /// Replaces the visible URL without navigating.
    fn replace_url(&self, url: &Url);
    /// Full navigation to `path` on the current origin.
    fn redirect(&self, path: &str);
}

/// Navigator that only records what it was asked to do.
#[derive(Debug)]
pub struct HeadlessNavigator {
    current: Mutex<Url>,
    redirects: Mutex<Vec<String>>,
}

impl HeadlessNavigator {
    pub fn new(current: Url) -> Self {
        Self {
            current: Mutex::new(current),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Navigator for HeadlessNavigator {
    fn current_url(&self) -> Url {
        match self.current.lock() {
            Ok(url) => url.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_url(&self, url: &Url) {
        if let Ok(mut current) = self.current.lock() {
            *current = url.clone();
        }
    }

    fn redirect(&self, path: &str) {
        if let Ok(mut redirects) = self.redirects.lock() {
            redirects.push(path.to_string());
        }
        let next = self.current_url().join(path);
        if let (Ok(next), Ok(mut current)) = (next, self.current.lock()) {
            *current = next;
        }
    }
}

/// Returns `url` without the given query parameters, keeping the others in order.
pub fn strip_query_params(url: &Url, names: &[&str]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !names.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}
