//! Connection profile persistence.
//!
//! Profiles live in a single JSON object keyed by profile id. Every mutation
//! rewrites the whole file.

use lavadash_core::{ConnectionProfile, ProfileMap};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid profile file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage for saved connection profiles.
///
/// `load` and `save` never fail from the caller's point of view: problems are
/// logged and masked (an unreadable store reads as empty, a failed write is
/// dropped).
pub trait ProfileStore: Send + Sync {
    fn load(&self) -> ProfileMap;
    fn save(&self, profiles: &ProfileMap);
    /// Insert or overwrite a profile, assigning a fresh id when it has none.
    /// Returns the profile as stored.
    fn upsert(&self, profile: ConnectionProfile) -> ConnectionProfile;
    /// Remove a profile. Returns whether it existed.
    fn delete(&self, id: &str) -> bool;
}

/// File-backed [`ProfileStore`].
pub struct JsonProfileStore {
    path: PathBuf,
    /// Held across every load-modify-save sequence.
    lock: Mutex<()>,
}

/// Contents of the profiles file. Entries that do not match the profile
/// schema are kept verbatim in `unparsed` and written back on every save.
#[derive(Debug, Default)]
struct ProfileFile {
    profiles: ProfileMap,
    unparsed: Map<String, Value>,
}

impl ProfileFile {
    fn remove(&mut self, id: &str) -> bool {
        let parsed = self.profiles.remove(id).is_some();
        let unparsed = self.unparsed.remove(id).is_some();
        parsed || unparsed
    }
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn json_err(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            path: self.path.clone(),
            source,
        }
    }

    fn read_file(&self) -> Result<ProfileFile, StoreError> {
        if !self.path.exists() {
            return Ok(ProfileFile::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(ProfileFile::default());
        }

        let entries: Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| self.json_err(e))?;

        let mut file = ProfileFile::default();
        for (id, entry) in entries {
            match serde_json::from_value::<ConnectionProfile>(entry.clone()) {
                Ok(mut profile) => {
                    if profile.id.is_empty() {
                        profile.id = id.clone();
                    }
                    file.profiles.insert(id, profile);
                }
                Err(e) => {
                    log::warn!(
                        "Skipping unreadable profile {:?} in {}: {}",
                        id,
                        self.path.display(),
                        e
                    );
                    file.unparsed.insert(id, entry);
                }
            }
        }
        Ok(file)
    }

    /// Write atomically (temp file + rename).
    fn write_file(&self, file: &ProfileFile) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut entries = file.unparsed.clone();
        for (id, profile) in &file.profiles {
            entries.insert(
                id.clone(),
                serde_json::to_value(profile).map_err(|e| self.json_err(e))?,
            );
        }
        let content = serde_json::to_string_pretty(&entries).map_err(|e| self.json_err(e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Profiles carry node passwords.
            let _ = std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600));
        }

        std::fs::rename(&tmp_path, &self.path).map_err(io_err)
    }

    /// Current file contents as the starting point of a mutation.
    ///
    /// A file that is not JSON at all is replaced, as it holds nothing
    /// recoverable. A file that could not be read returns `None` and must not
    /// be overwritten.
    fn read_for_update(&self) -> Option<ProfileFile> {
        match self.read_file() {
            Ok(file) => Some(file),
            Err(e @ StoreError::Json { .. }) => {
                log::error!("Error loading configs: {}", e);
                Some(ProfileFile::default())
            }
            Err(e) => {
                log::error!("Error loading configs, leaving file untouched: {}", e);
                None
            }
        }
    }

    fn write_logged(&self, file: &ProfileFile) {
        if let Err(e) = self.write_file(file) {
            log::error!("Error saving configs: {}", e);
        }
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(&self) -> ProfileMap {
        let _guard = self.lock.lock();
        match self.read_file() {
            Ok(file) => file.profiles,
            Err(e) => {
                log::error!("Error loading configs: {}", e);
                ProfileMap::new()
            }
        }
    }

    /// Replaces every readable profile with `profiles`. Unreadable entries
    /// already in the file are kept unless `profiles` reuses their id.
    fn save(&self, profiles: &ProfileMap) {
        let _guard = self.lock.lock();
        let Some(mut file) = self.read_for_update() else {
            return;
        };
        file.unparsed.retain(|id, _| !profiles.contains_key(id));
        file.profiles = profiles.clone();
        self.write_logged(&file);
    }

    fn upsert(&self, mut profile: ConnectionProfile) -> ConnectionProfile {
        let _guard = self.lock.lock();

        if profile.id.is_empty() {
            profile.id = uuid::Uuid::new_v4().to_string();
        }

        if let Some(mut file) = self.read_for_update() {
            file.unparsed.remove(&profile.id);
            file.profiles.insert(profile.id.clone(), profile.clone());
            self.write_logged(&file);
            log::info!("Saved connection profile {} ({})", profile.id, profile.name);
        }
        profile
    }

    fn delete(&self, id: &str) -> bool {
        let _guard = self.lock.lock();

        let Some(mut file) = self.read_for_update() else {
            return false;
        };
        if !file.remove(id) {
            return false;
        }
        self.write_logged(&file);

        log::info!("Deleted connection profile {}", id);
        true
    }
}
