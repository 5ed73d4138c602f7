//! JSON file credential storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use remote_repl_core::traits::{CredentialError, CredentialStore, Credentials};

const APP_DIR: &str = "remote-repl";
const FILE_NAME: &str = "config.json";

/// Credentials stored as pretty-printed JSON in a single file.
///
/// A missing file means "not logged in"; a file that does not parse is an
/// error rather than being silently replaced.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/remote-repl/config.json`.
    ///
    /// # Errors
    /// Returns error if the platform has no config directory.
    pub fn default_location() -> Result<Self, CredentialError> {
        let base = dirs::config_dir().ok_or(CredentialError::NoLocation)?;
        Ok(Self::new(base.join(APP_DIR).join(FILE_NAME)))
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| CredentialError::Malformed {
                path: self.path.clone(),
                source,
            })
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut contents = serde_json::to_string_pretty(credentials)
            .map_err(|e| CredentialError::Internal(e.to_string()))?;
        contents.push('\n');

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(|e| self.io_error(e))?;
        // `mode` only applies when the file is created.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.io_error(e))?;
        }
        tokio::io::AsyncWriteExt::write_all(&mut file, contents.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::io::AsyncWriteExt::flush(&mut file)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use remote_repl_core::ApiToken;
    use url::Url;

    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_not_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("config.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("config.json"));
        let credentials = Credentials::new(
            ApiToken::new("id.secret"),
            Url::parse("https://api.example.com").unwrap(),
        );

        store.save(&credentials).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credentials));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["token"], "id.secret");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("config.json"));
        store.save(&Credentials::default()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(&path);
        store
            .save(&Credentials {
                token: Some(ApiToken::new("id.secret")),
                server_url: None,
            })
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileCredentialStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_clear_keeps_server_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("config.json"));
        let url = Url::parse("https://api.example.com").unwrap();
        store
            .save(&Credentials::new(ApiToken::new("t"), url.clone()))
            .await
            .unwrap();

        assert!(store.clear().await.unwrap());
        assert!(!store.clear().await.unwrap());
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.token, None);
        assert_eq!(stored.server_url, Some(url));
    }
}
