//! Runtime settings read from the environment
//!
//! A `.env` file in the working directory is honoured. Nothing is written
//! back: keys given here only live for the process.

use crate::embedding::{ApiProvider, DEFAULT_LOCAL_MODEL};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Settings for the registry and its embedders
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub cohere_api_key: Option<String>,
    pub openai_base_url: String,
    pub cohere_base_url: String,
    pub local_model: String,
    /// Hub cache directory (the one holding `models--*`), from `HF_HOME`
    pub hf_cache_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            openai_api_key: None,
            cohere_api_key: None,
            openai_base_url: ApiProvider::OpenAI.default_base_url().to_string(),
            cohere_base_url: ApiProvider::Cohere.default_base_url().to_string(),
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
            hf_cache_dir: None,
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and then read the process environment
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_vars(std::env::vars())
    }

    /// Read settings from an explicit dotenv file, ignoring the process env
    pub fn from_file(path: &Path) -> Result<Self> {
        let vars = dotenvy::from_path_iter(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Self::from_vars(vars))
    }

    /// Build settings from key/value pairs; blank values count as unset
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        let defaults = Settings::default();
        Settings {
            openai_api_key: vars.get(ApiProvider::OpenAI.env_var_name()).cloned(),
            cohere_api_key: vars.get(ApiProvider::Cohere.env_var_name()).cloned(),
            openai_base_url: vars
                .get("OPENAI_BASE_URL")
                .cloned()
                .unwrap_or(defaults.openai_base_url),
            cohere_base_url: vars
                .get("COHERE_BASE_URL")
                .cloned()
                .unwrap_or(defaults.cohere_base_url),
            local_model: vars
                .get("EMBCMP_LOCAL_MODEL")
                .cloned()
                .unwrap_or(defaults.local_model),
            // Same layout the hub itself uses: models live under $HF_HOME/hub
            hf_cache_dir: vars.get("HF_HOME").map(|home| PathBuf::from(home).join("hub")),
        }
    }

    pub fn api_key(&self, provider: ApiProvider) -> Option<&str> {
        match provider {
            ApiProvider::OpenAI => self.openai_api_key.as_deref(),
            ApiProvider::Cohere => self.cohere_api_key.as_deref(),
        }
    }

    pub fn base_url(&self, provider: ApiProvider) -> &str {
        match provider {
            ApiProvider::OpenAI => &self.openai_base_url,
            ApiProvider::Cohere => &self.cohere_base_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(Vec::<(String, String)>::new());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.local_model, DEFAULT_LOCAL_MODEL);
        assert_eq!(settings.api_key(ApiProvider::OpenAI), None);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_vars([
            ("OPENAI_API_KEY", "sk-test"),
            ("COHERE_BASE_URL", "http://127.0.0.1:8080/v1"),
            ("EMBCMP_LOCAL_MODEL", "BAAI/bge-small-en-v1.5"),
            ("COHERE_API_KEY", "  "),
        ]);
        assert_eq!(settings.api_key(ApiProvider::OpenAI), Some("sk-test"));
        assert_eq!(settings.api_key(ApiProvider::Cohere), None);
        assert_eq!(
            settings.base_url(ApiProvider::Cohere),
            "http://127.0.0.1:8080/v1"
        );
        assert_eq!(
            settings.base_url(ApiProvider::OpenAI),
            "https://api.openai.com/v1"
        );
        assert_eq!(settings.local_model, "BAAI/bge-small-en-v1.5");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "COHERE_API_KEY=co-123").unwrap();
        writeln!(file, "HF_HOME=/tmp/hf").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.api_key(ApiProvider::Cohere), Some("co-123"));
        assert_eq!(settings.hf_cache_dir, Some(PathBuf::from("/tmp/hf/hub")));
    }

    #[test]
    fn test_no_hf_home_uses_hub_default() {
        let settings = Settings::from_vars([("HF_HOME", "  ")]);
        assert_eq!(settings.hf_cache_dir, None);
    }

    #[test]
    fn test_from_missing_file() {
        let err = Settings::from_file(Path::new("/definitely/not/here.env")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
