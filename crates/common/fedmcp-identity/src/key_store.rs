use crate::{Did, KeyMaterial};
use chrono::{DateTime, Utc};
use fedmcp_types::KeyMaterialError;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Overrides the key file location.
pub const KEY_PATH_ENV: &str = "FEDMCP_KEY_PATH";
/// Per-user directory under `$HOME`.
pub const FEDMCP_HOME_DIR: &str = ".fedmcp";
pub const DEFAULT_KEY_FILE: &str = "signing-key.json";

const KEY_ALGORITHM: &str = "Ed25519";

/// On-disk layout of the signing key file.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct KeyFile {
    did: String,
    key_id: String,
    algorithm: String,
    public_key: String,
    secret_key: String,
    #[zeroize(skip)]
    generated_at: DateTime<Utc>,
}

impl KeyFile {
    fn from_material(key: &KeyMaterial) -> Self {
        Self {
            did: key.did().to_string(),
            key_id: key.key_id().to_string(),
            algorithm: KEY_ALGORITHM.to_string(),
            public_key: hex::encode(key.verifying_key().as_bytes()),
            secret_key: hex::encode(key.secret_bytes().as_slice()),
            generated_at: Utc::now(),
        }
    }

    /// Rebuild key material from the secret and check every derived field.
    fn into_material(self, path: &Path) -> Result<KeyMaterial, KeyMaterialError> {
        let corrupt = |reason: String| KeyMaterialError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if self.algorithm != KEY_ALGORITHM {
            return Err(corrupt(format!("unsupported algorithm '{}'", self.algorithm)));
        }

        let mut seed = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(&self.secret_key, seed.as_mut_slice())
            .map_err(|e| corrupt(format!("secret key: {e}")))?;
        let key = KeyMaterial::from_seed(&seed);

        if hex::encode(key.verifying_key().as_bytes()) != self.public_key {
            return Err(corrupt("public key does not match secret key".into()));
        }
        if key.key_id().as_str() != self.key_id {
            return Err(corrupt(format!("stored key ID '{}' does not match key", self.key_id)));
        }
        let did: Did = self
            .did
            .parse()
            .map_err(|e| corrupt(format!("did: {e}")))?;
        if &did != key.did() {
            return Err(corrupt("stored DID does not match key".into()));
        }
        Ok(key)
    }
}

/// File-backed store for the local signing key.
///
/// One key per path. Loading is read-only; generation writes the file with
/// owner-only permissions through a temp file in the same directory, so a
/// reader never observes a half-written key.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$FEDMCP_KEY_PATH`, else `~/.fedmcp/signing-key.json`.
    pub fn default_location() -> Self {
        if let Some(path) = std::env::var_os(KEY_PATH_ENV).filter(|p| !p.is_empty()) {
            return Self::new(path);
        }
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(FEDMCP_HOME_DIR).join(DEFAULT_KEY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load existing key material. Never generates.
    pub fn load(&self) -> Result<KeyMaterial, KeyMaterialError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => Zeroizing::new(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(KeyMaterialError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(KeyMaterialError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let file: KeyFile =
            serde_json::from_slice(&contents).map_err(|e| KeyMaterialError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        let key = file.into_material(&self.path)?;
        tracing::debug!(path = %self.path.display(), key_id = %key.key_id(), "Loaded signing key");
        Ok(key)
    }

    /// Load the key, generating and persisting one only if none exists.
    ///
    /// A corrupt or unreadable file is an error, never silently replaced.
    /// When two processes race to create the key, the loser adopts the
    /// winner's key, so both end up with the same key ID.
    pub fn load_or_generate(&self) -> Result<KeyMaterial, KeyMaterialError> {
        match self.load() {
            Ok(key) => Ok(key),
            Err(KeyMaterialError::Missing { .. }) => match self.generate(false) {
                Ok(key) => Ok(key),
                Err(KeyMaterialError::AlreadyExists { .. }) => {
                    tracing::debug!(path = %self.path.display(), "Key created concurrently, loading it");
                    self.load()
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Generate a new key and write it. Refuses to replace an existing file
    /// unless `overwrite` is set.
    pub fn generate(&self, overwrite: bool) -> Result<KeyMaterial, KeyMaterialError> {
        let key = KeyMaterial::generate();
        self.persist(&key, overwrite)?;
        tracing::info!(path = %self.path.display(), key_id = %key.key_id(), "Generated signing key");
        Ok(key)
    }

    fn persist(&self, key: &KeyMaterial, overwrite: bool) -> Result<(), KeyMaterialError> {
        let io_err = |source: io::Error| KeyMaterialError::Io {
            path: self.path.clone(),
            source,
        };

        if !overwrite && self.path.exists() {
            return Err(KeyMaterialError::AlreadyExists {
                path: self.path.clone(),
            });
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let encoded = Zeroizing::new(serde_json::to_vec_pretty(&KeyFile::from_material(key))?);

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }
        tmp.write_all(&encoded).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        let persisted = if overwrite {
            tmp.persist(&self.path)
        } else {
            tmp.persist_noclobber(&self.path)
        };
        persisted.map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                KeyMaterialError::AlreadyExists {
                    path: self.path.clone(),
                }
            } else {
                io_err(e.error)
            }
        })?;
        Ok(())
    }
}
