//! Session-scoped provider credentials
//!
//! Keys live in memory only. The owning [`crate::Session`] hands out clones
//! of the handle to whichever embedder needs to read them.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to the in-memory credential map
///
/// Provider names are normalized to lower case, so `"Cohere"` and
/// `"cohere"` address the same entry. Blank keys are treated as absent.
#[derive(Clone, Default)]
pub struct CredentialSet {
    keys: Arc<RwLock<HashMap<String, String>>>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(provider: &str) -> String {
        provider.trim().to_lowercase()
    }

    /// Set (or replace) the key for a provider
    pub fn set(&self, provider: &str, key: &str) {
        let key = key.trim();
        let provider = Self::normalize(provider);
        if key.is_empty() {
            self.keys.write().remove(&provider);
        } else {
            tracing::debug!(provider = %provider, "credential updated");
            self.keys.write().insert(provider, key.to_string());
        }
    }

    /// Key for a provider, if one is set and non-blank
    pub fn get(&self, provider: &str) -> Option<String> {
        self.keys.read().get(&Self::normalize(provider)).cloned()
    }

    pub fn has(&self, provider: &str) -> bool {
        self.keys.read().contains_key(&Self::normalize(provider))
    }

    pub fn remove(&self, provider: &str) {
        self.keys.write().remove(&Self::normalize(provider));
    }

    /// Providers that currently have a key, sorted
    pub fn providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = self.keys.read().keys().cloned().collect();
        providers.sort();
        providers
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secrets themselves
        f.debug_struct("CredentialSet")
            .field("providers", &self.providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_normalizes_provider() {
        let creds = CredentialSet::new();
        creds.set("Cohere", "  abc123 ");
        assert_eq!(creds.get("cohere").as_deref(), Some("abc123"));
        assert_eq!(creds.get("COHERE").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_blank_key_is_absent() {
        let creds = CredentialSet::new();
        creds.set("openai", "sk-1");
        creds.set("openai", "   ");
        assert!(!creds.has("openai"));
        assert_eq!(creds.get("openai"), None);
    }

    #[test]
    fn test_clones_share_state() {
        let creds = CredentialSet::new();
        let handle = creds.clone();
        creds.set("openai", "sk-1");
        assert!(handle.has("openai"));
        handle.remove("openai");
        assert!(!creds.has("openai"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = CredentialSet::new();
        creds.set("openai", "sk-secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("openai"));
        assert!(!debug.contains("sk-secret"));
    }
}
