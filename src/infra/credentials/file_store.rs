use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::ProviderKind;

use super::{CredentialStore, CredentialStoreError};

const ENV_CREDENTIALS_PATH: &str = "MAPI_CREDENTIALS_PATH";
const APP_DIR: &str = "mapi";
const FILE_NAME: &str = "credentials.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_provider: Option<ProviderKind>,
    #[serde(default)]
    credentials: BTreeMap<ProviderKind, String>,
}

/// JSON-file backed store. Every call re-reads the file so edits made by
/// another process are picked up; writes go through a temp file and rename.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Uses `MAPI_CREDENTIALS_PATH` when set, otherwise the per-user default path.
    pub fn open_default() -> Result<Self, CredentialStoreError> {
        match path_override(env::var_os(ENV_CREDENTIALS_PATH)) {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(default_path()?)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialFile, CredentialStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(CredentialFile::default());
            }
            Err(source) => {
                return Err(CredentialStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(CredentialFile::default());
        }

        serde_json::from_str(&contents).map_err(|source| CredentialStoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, file: &CredentialFile) -> Result<(), CredentialStoreError> {
        let json = serde_json::to_string_pretty(file).map_err(CredentialStoreError::Encode)?;
        let io_error = |source: std::io::Error| CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        write_private(&temp_path, json.as_bytes()).map_err(io_error)?;
        fs::rename(&temp_path, &self.path).map_err(io_error)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), CredentialStoreError>
    where
        F: FnOnce(&mut CredentialFile),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        apply(&mut file);
        self.save(&file)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, provider: ProviderKind) -> Result<Option<String>, CredentialStoreError> {
        Ok(self
            .load()?
            .credentials
            .remove(&provider)
            .filter(|secret| !secret.trim().is_empty()))
    }

    fn set(&self, provider: ProviderKind, secret: &str) -> Result<(), CredentialStoreError> {
        self.update(|file| {
            if secret.trim().is_empty() {
                file.credentials.remove(&provider);
            } else {
                file.credentials.insert(provider, secret.to_string());
            }
        })
    }

    fn delete(&self, provider: ProviderKind) -> Result<(), CredentialStoreError> {
        self.update(|file| {
            file.credentials.remove(&provider);
        })
    }

    fn selected_provider(&self) -> Result<Option<ProviderKind>, CredentialStoreError> {
        Ok(self.load()?.selected_provider)
    }

    fn select_provider(&self, provider: ProviderKind) -> Result<(), CredentialStoreError> {
        self.update(|file| file.selected_provider = Some(provider))
    }
}

// Non-UTF-8 paths are honored as-is; only an unset or blank value falls back.
fn path_override(value: Option<OsString>) -> Option<PathBuf> {
    value
        .filter(|value| !value.to_string_lossy().trim().is_empty())
        .map(PathBuf::from)
}

fn default_path() -> Result<PathBuf, CredentialStoreError> {
    #[cfg(target_os = "windows")]
    {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
            .ok_or(CredentialStoreError::NoConfigDir)
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .map(|home| home.join(".config").join(APP_DIR).join(FILE_NAME))
            .ok_or(CredentialStoreError::NoConfigDir)
    }
}

/// Writes `contents` to a file that is owner-only from the moment it exists.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a temp file left by a crash keeps its old bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::fs;
    use std::path::PathBuf;

    use super::{FileCredentialStore, path_override};
    use crate::domain::ProviderKind;
    use crate::infra::credentials::{CredentialStore, CredentialStoreError};

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileCredentialStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get(ProviderKind::OpenAi).expect("get"), None);
        assert_eq!(store.selected_provider().expect("selected"), None);
    }

    #[test]
    fn set_persists_across_instances_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store
            .set(ProviderKind::Anthropic, "sk-ant-1")
            .expect("set should succeed");
        store
            .select_provider(ProviderKind::Anthropic)
            .expect("select should succeed");

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(
            reopened.get(ProviderKind::Anthropic).expect("get"),
            Some("sk-ant-1".to_string())
        );
        assert_eq!(
            reopened.selected_provider().expect("selected"),
            Some(ProviderKind::Anthropic)
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_layout_is_keyed_by_provider_identifier() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(&path);
        store.set(ProviderKind::Gemini, "AIza-1").expect("set");
        store.select_provider(ProviderKind::Gemini).expect("select");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");

        assert_eq!(json["selected_provider"], "gemini");
        assert_eq!(json["credentials"]["gemini"], "AIza-1");
    }

    #[test]
    fn delete_removes_only_that_provider() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.set(ProviderKind::OpenAi, "sk-1").expect("set");
        store.set(ProviderKind::Grok, "xai-1").expect("set");

        store.delete(ProviderKind::OpenAi).expect("delete");

        assert_eq!(store.get(ProviderKind::OpenAi).expect("get"), None);
        assert_eq!(
            store.get(ProviderKind::Grok).expect("get"),
            Some("xai-1".to_string())
        );
    }

    #[test]
    fn corrupt_file_reports_decode_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").expect("write");

        let error = FileCredentialStore::new(&path)
            .get(ProviderKind::OpenAi)
            .expect_err("corrupt file should fail");

        assert!(matches!(error, CredentialStoreError::Decode { .. }));
    }

    #[test]
    fn path_override_ignores_unset_and_blank_values() {
        assert_eq!(path_override(None), None);
        assert_eq!(path_override(Some(OsString::from("  "))), None);
        assert_eq!(
            path_override(Some(OsString::from("/srv/mapi/keys.json"))),
            Some(PathBuf::from("/srv/mapi/keys.json"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn path_override_keeps_non_utf8_paths() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let raw = OsString::from_vec(b"/tmp/keys-\xff.json".to_vec());
        let path = path_override(Some(raw)).expect("non-UTF-8 path should be kept");

        assert_eq!(path.as_os_str().as_bytes(), b"/tmp/keys-\xff.json");
    }

    #[cfg(unix)]
    #[test]
    fn write_private_creates_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json.tmp");
        super::write_private(&path, b"{}").expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn stale_world_readable_temp_file_is_tightened_before_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, "leftover").expect("write stale temp file");
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o644)).expect("chmod");

        super::write_private(&temp_path, b"{}").expect("write");
        let mode = fs::metadata(&temp_path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&temp_path).expect("read"), "{}");

        FileCredentialStore::new(&path)
            .set(ProviderKind::OpenAi, "sk-1")
            .expect("set");
        assert!(!temp_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");
        FileCredentialStore::new(&path)
            .set(ProviderKind::OpenAi, "sk-1")
            .expect("set");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
