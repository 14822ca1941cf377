use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::CredentialPair;

/// Storage abstraction for the session's credential pair.
///
/// Implementations hold no business logic; they only make the pair visible to
/// the request interceptor and the refresh coordinator.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<CredentialPair>, AuthError>;
    fn save(&self, pair: &CredentialPair) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;

    /// Current access credential, if any.
    fn access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.map(|pair| pair.access_token))
    }
}

/// Configuration for file-backed credential storage.
#[derive(Debug, Clone)]
pub struct CredentialStoreConfig {
    pub base_dir: PathBuf,
    pub profile: String,
}

impl CredentialStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            profile: "default".to_string(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn default_dir() -> PathBuf {
        default_tether_dir()
    }
}

/// File-backed credential store using one TOML file per profile.
///
/// # Example
/// ```no_run
/// use tether::auth::{CredentialPair, CredentialStore, CredentialStoreConfig, FileCredentialStore};
///
/// let store = FileCredentialStore::new(CredentialStoreConfig::new("/tmp/tether".into()));
/// store.save(&CredentialPair::new("access", Some("refresh".to_string())))?;
/// # Ok::<(), tether::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
    profile: String,
}

impl FileCredentialStore {
    pub fn new(config: CredentialStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
            profile: config.profile,
        }
    }

    pub fn new_default() -> Self {
        Self::new(CredentialStoreConfig::new(default_tether_dir()))
    }

    pub fn path(&self) -> PathBuf {
        let profile = normalize_label(&self.profile);
        let name = if profile == "default" {
            "credentials.toml".to_string()
        } else {
            format!("credentials.{profile}.toml")
        };
        self.base_dir.join(name)
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<CredentialPair>, AuthError> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: CredentialFile = toml::from_str(&raw)?;
        Ok(Some(file.credentials))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = CredentialFile {
            version: 1,
            profile: self.profile.clone(),
            credentials: pair.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<Option<CredentialPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<CredentialPair>, AuthError> {
        let guard = self
            .pair
            .read()
            .map_err(|_| AuthError::Io("credential store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        let mut guard = self
            .pair
            .write()
            .map_err(|_| AuthError::Io("credential store lock poisoned".to_string()))?;
        *guard = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self
            .pair
            .write()
            .map_err(|_| AuthError::Io("credential store lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    profile: String,
    credentials: CredentialPair,
    saved_at: DateTime<Utc>,
}

fn default_tether_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".tether"))
        .unwrap_or_else(|| PathBuf::from(".tether"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store(profile: &str) -> (TempDir, FileCredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(
            CredentialStoreConfig::new(dir.path().to_path_buf()).with_profile(profile),
        );
        (dir, store)
    }

    #[test]
    fn file_store_round_trip_works() {
        let (_dir, store) = temp_store("default");
        let pair = CredentialPair::new("access", Some("refresh".to_string()));
        store.save(&pair).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access"));
    }

    #[test]
    fn file_store_clear_removes_pair() {
        let (_dir, store) = temp_store("default");
        store.save(&CredentialPair::new("access", None)).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_clear_missing_is_noop() {
        let (_dir, store) = temp_store("default");
        store.clear().unwrap();
    }

    #[test]
    fn profiles_map_to_separate_files() {
        let (dir, store) = temp_store("Work Account");
        assert_eq!(
            store.path(),
            dir.path().join("credentials.work-account.toml")
        );
        let (dir, store) = temp_store("  ");
        assert_eq!(store.path(), dir.path().join("credentials.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store("default");
        store.save(&CredentialPair::new("access", None)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_set_and_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());
        store
            .save(&CredentialPair::new("A1", Some("R1".to_string())))
            .unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("A1"));
        store.clear().unwrap();
        assert!(store.access_token().unwrap().is_none());
    }
}
