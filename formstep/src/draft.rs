//! Draft persistence: stores and the JSON layer on top of them.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use formstep_types::{DraftError, DraftKey, DraftStore, FormDefinition, FormValues};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Stores each draft as `<dir>/<key>.json`.
///
/// Writes go to a temporary file in the same directory that is then renamed
/// over the target, so a crash never leaves a half-written draft.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileDraftStore {
    /// Store drafts in `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: None,
        }
    }

    /// Limit the total size of all drafts in the directory.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// The directory drafts live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a draft is stored in.
    pub fn path_for(&self, key: &DraftKey) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }

    /// List the draft files currently stored, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>, DraftError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Bytes used by every draft except the one at `skip`.
    fn used_bytes(&self, skip: &Path) -> Result<u64, DraftError> {
        let mut used = 0;
        for path in self.list()? {
            if path != skip {
                used += fs::metadata(&path)?.len();
            }
        }
        Ok(used)
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, key: &DraftKey) -> Result<Option<String>, DraftError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &DraftKey, contents: &str) -> Result<(), DraftError> {
        let path = self.path_for(key);
        if let Some(quota) = self.quota {
            let available = quota.saturating_sub(self.used_bytes(&path)?);
            let needed = contents.len() as u64;
            if needed > available {
                return Err(DraftError::QuotaExceeded { needed, available });
            }
        }

        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &DraftKey) -> Result<(), DraftError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Bytes kept verbatim in draft file names. Everything else, `%` included,
/// is percent-encoded so distinct keys never share a file.
const STEM_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-').remove(b'.');

/// Map a draft key to a file stem that is safe on every platform.
fn file_stem(key: &DraftKey) -> String {
    utf8_percent_encode(key.as_str(), STEM_SAFE).to_string()
}

#[derive(Debug, Default)]
struct MemoryInner {
    drafts: HashMap<String, String>,
    quota: Option<u64>,
    disabled: bool,
}

/// In-process draft storage.
///
/// Clones share the same map, so a test can keep a handle and inspect what a
/// session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses every write, as when storage is turned off.
    pub fn disabled() -> Self {
        let store = Self::new();
        store.lock().disabled = true;
        store
    }

    /// Limit the total size of all stored drafts.
    pub fn with_quota(self, bytes: u64) -> Self {
        self.lock().quota = Some(bytes);
        self
    }

    /// Seed a raw draft, bypassing quota checks.
    pub fn insert(&self, key: &DraftKey, contents: impl Into<String>) {
        self.lock()
            .drafts
            .insert(key.as_str().to_string(), contents.into());
    }

    /// The raw draft under `key`, if any.
    pub fn get(&self, key: &DraftKey) -> Option<String> {
        self.lock().drafts.get(key.as_str()).cloned()
    }

    pub fn contains(&self, key: &DraftKey) -> bool {
        self.lock().drafts.contains_key(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.lock().drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned map is still a valid map.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &DraftKey) -> Result<Option<String>, DraftError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &DraftKey, contents: &str) -> Result<(), DraftError> {
        let mut inner = self.lock();
        if inner.disabled {
            return Err(DraftError::Disabled);
        }
        if let Some(quota) = inner.quota {
            let used: u64 = inner
                .drafts
                .iter()
                .filter(|(k, _)| k.as_str() != key.as_str())
                .map(|(_, v)| v.len() as u64)
                .sum();
            let available = quota.saturating_sub(used);
            let needed = contents.len() as u64;
            if needed > available {
                return Err(DraftError::QuotaExceeded { needed, available });
            }
        }
        inner
            .drafts
            .insert(key.as_str().to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &DraftKey) -> Result<(), DraftError> {
        self.lock().drafts.remove(key.as_str());
        Ok(())
    }
}

/// A form's draft slot: a store plus the key the form's values live under.
pub struct Drafts {
    store: Box<dyn DraftStore>,
    key: DraftKey,
}

impl Drafts {
    /// The draft slot for `definition` in `store`.
    pub fn new(store: impl DraftStore + 'static, definition: &FormDefinition) -> Self {
        Self {
            store: Box::new(store),
            key: definition.draft_key(),
        }
    }

    pub fn key(&self) -> &DraftKey {
        &self.key
    }

    /// Restore the saved values for `definition`.
    ///
    /// Never fails: a missing draft, an unreadable store or malformed JSON all
    /// yield an empty map. Keys the definition no longer has are dropped.
    pub fn restore(&self, definition: &FormDefinition) -> FormValues {
        let raw = match self.store.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return FormValues::new(),
            Err(err) => {
                tracing::warn!(draft = %self.key, error = %err, "could not read draft");
                return FormValues::new();
            }
        };

        let mut values = match FormValues::from_json(&raw) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(draft = %self.key, error = %err, "ignoring malformed draft");
                return FormValues::new();
            }
        };

        let before = values.len();
        values.retain(|key| definition.item(key).is_some());
        if values.len() < before {
            tracing::warn!(
                draft = %self.key,
                dropped = before - values.len(),
                "dropped draft values for fields no longer in the form"
            );
        }
        tracing::debug!(draft = %self.key, fields = values.len(), "restored draft");
        values
    }

    /// Persist the whole value map.
    pub fn save(&self, values: &FormValues) -> Result<(), DraftError> {
        let json = values.to_json()?;
        self.store.save(&self.key, &json)
    }

    /// Delete the draft.
    pub fn discard(&self) -> Result<(), DraftError> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for Drafts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drafts").field("key", &self.key).finish_non_exhaustive()
    }
}
