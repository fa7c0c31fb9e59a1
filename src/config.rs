use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Origin used when neither a base URL nor an origin is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Persisted base URL preference. Falls back to `origin` when unset.
    pub base_url: Option<String>,
    /// The server this client was pointed at first, used as the fallback base.
    pub origin: String,
    /// Downloads and CSV exports are written here.
    pub export_dir: PathBuf,
    /// Database identifiers offered by the selector.
    pub databases: Vec<String>,
    /// Extra headers attached to every request (e.g. `Authorization`).
    pub headers: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            origin: DEFAULT_ORIGIN.to_string(),
            export_dir: PathBuf::from("."),
            databases: vec!["sqlite".to_string(), "mariadb".to_string()],
            headers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir() // Use the OS agnostic config dir on all systems
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbtui")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// `Ok(None)` only when there is no file yet. A file that exists but does
    /// not parse is an error and is left alone.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map(Some).map_err(|source| {
            warn!(path = %path.display(), error = %source, "config does not parse");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, text)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// The fallback origin, never empty.
    pub fn origin(&self) -> &str {
        let origin = self.origin.trim();
        if origin.is_empty() { DEFAULT_ORIGIN } else { origin }
    }

    /// The active API base: the saved preference, or the origin when there is none.
    pub fn base_url(&self) -> String {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.origin().to_string(),
        }
    }

    /// Stores the trimmed value, or the origin itself when the value is blank.
    /// Persisting is left to the caller.
    pub fn set_base_url(&mut self, value: &str) {
        let value = value.trim();
        let stored = if value.is_empty() {
            self.origin().to_string()
        } else {
            value.to_string()
        };
        self.base_url = Some(stored);
    }
}

/// Path and query templates for the bridge API. No validation of identifiers
/// happens here; the server rejects what it does not know.
pub mod endpoint {
    pub fn upload(db: &str) -> String {
        format!("/api/db/{db}/upload")
    }

    pub fn download(db: &str) -> String {
        format!("/api/db/{db}/download")
    }

    pub fn relocate(from: &str, to: &str) -> String {
        format!("/api/admin/relocate?from={from}&to={to}")
    }

    pub fn sync(db: &str) -> String {
        format!("/api/admin/sync?db={db}")
    }

    // The whole filter text becomes the query string, encoded as one component
    pub fn data(db: &str, filter: Option<&str>) -> String {
        match filter.map(str::trim) {
            Some(f) if !f.is_empty() => format!("/api/db/{db}/data?{}", encode_component(f)),
            _ => format!("/api/db/{db}/data"),
        }
    }

    pub fn schema(db: &str) -> String {
        format!("/api/db/{db}/schema")
    }

    pub fn health() -> String {
        "/api/health".to_string()
    }

    fn encode_component(text: &str) -> String {
        // form encoding turns spaces into '+', a literal '+' is already %2B
        url::form_urlencoded::byte_serialize(text.as_bytes())
            .collect::<String>()
            .replace('+', "%20")
    }
}
