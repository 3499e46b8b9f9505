//! Entity store and bulk loader for the flat-file database.
//!
//! One text file per entity instance, named `<uuid>.txt`, under
//! `<data-root>/<entity-type-directory>/`. Writes are atomic: the record is
//! staged to a temp file under an exclusive lock and renamed into place.
//! Loading is a two-phase protocol: each record's plain attributes are set
//! immediately while deferred ones are parked in the [`DeferredRegistry`];
//! after every entity type has finished its `load_all` pass, a single
//! `complete_load` call resolves the parked entries against the registry.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{error, warn};
use tokio::fs;

use crate::db::codec;
use crate::db::deferred::DeferredRegistry;
use crate::db::error::StorageError;
use crate::db::record::StoredRecord;
use crate::db::schema::{FieldDef, Indexed, ReferenceIndex, Saveable};

/// Owns the data root and the per-type directory cache. The mapping from
/// entity type to directory is computed once per type and never invalidated
/// during a run; a restart picks up directory-scheme changes.
pub struct StoreConfig {
    root: PathBuf,
    dirs: HashMap<&'static str, PathBuf>,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dirs: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve (and cache) the directory for an entity type, creating it on
    /// first use. A path that names a plain file is a fatal configuration
    /// error.
    fn directory_for<T: Saveable>(&mut self) -> Result<PathBuf, StorageError> {
        let schema = T::schema();
        if let Some(dir) = self.dirs.get(schema.type_name) {
            return Ok(dir.clone());
        }
        let dir = self.root.join(schema.directory);
        ensure_directory(&dir, schema.type_name)?;
        self.dirs.insert(schema.type_name, dir.clone());
        Ok(dir)
    }
}

fn ensure_directory(dir: &Path, type_name: &str) -> Result<(), StorageError> {
    if dir.exists() && !dir.is_dir() {
        return Err(StorageError::Config(format!(
            "storage path {} for {} is not a directory",
            dir.display(),
            type_name
        )));
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        StorageError::Config(format!(
            "could not create directory {} for {}: {}",
            dir.display(),
            type_name,
            e
        ))
    })
}

/// Flat-file database over a registry type `R` (the in-memory indices that
/// receive loaded entities and back deferred-reference resolution).
pub struct FlatFileDb<R> {
    config: StoreConfig,
    deferred: DeferredRegistry<R>,
}

impl<R: ReferenceIndex> FlatFileDb<R> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: StoreConfig::new(root),
            deferred: DeferredRegistry::new(),
        }
    }

    pub fn data_root(&self) -> &Path {
        self.config.root()
    }

    /// Number of deferred entries currently awaiting `complete_load`.
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Serialize one entity and write its record file, overwriting any
    /// pre-existing file for the same identifier.
    pub async fn save<T: Saveable>(&mut self, entity: &T) -> Result<(), StorageError> {
        let schema = T::schema();
        let mut record = StoredRecord::new();
        for def in schema.fields {
            if def.transient {
                continue;
            }
            if let Some(value) = (def.get)(entity) {
                record.insert(def.name, codec::encode(&value, &def.kind)?);
            }
        }
        for def in schema.computed {
            if let Some(value) = (def.get)(entity) {
                record.insert(def.name, codec::encode(&value, &def.kind)?);
            }
        }

        let dir = self.config.directory_for::<T>()?;
        // The cache survives a wiped data tree; recreate on demand.
        if !dir.exists() {
            ensure_directory(&dir, schema.type_name)?;
        }
        let path = dir.join(format!("{}.txt", entity.id()));
        write_file_locked(&path, &record.to_text())
    }

    /// Remove an entity's record file. Returns `false` (and logs) when no
    /// file existed for the identifier; only configuration problems error.
    pub async fn delete<T: Saveable>(&mut self, entity: &T) -> Result<bool, StorageError> {
        let dir = self.config.directory_for::<T>()?;
        let path = dir.join(format!("{}.txt", entity.id()));
        if !path.exists() {
            error!("cannot delete {}: it does not exist", path.display());
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        Ok(true)
    }

    /// Reconstruct one entity from its record file. Deferred attributes are
    /// parked for `complete_load`; plain attributes that are missing or fail
    /// to parse keep their defaults. An unreadable file logs an error and
    /// yields `None` so one corrupt record never aborts a batch.
    pub async fn load<T: Indexed<R>>(&mut self, path: &Path) -> Option<T> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                error!("could not read {}: {}", path.display(), e);
                return None;
            }
        };
        let record = StoredRecord::parse(&text);
        let mut entity = T::blank();
        let mut parked: Vec<(&'static FieldDef<T>, String)> = Vec::new();
        for def in T::schema().fields {
            if def.transient {
                continue;
            }
            let Some(raw) = record.get(def.name) else {
                continue;
            };
            if def.deferred {
                parked.push((def, raw.to_string()));
                continue;
            }
            if let Some(value) = codec::decode(raw, &def.kind) {
                (def.set)(&mut entity, value);
            }
        }
        // The identifier field has been applied by now; park deferred
        // entries under the real owner id.
        for (def, raw) in parked {
            self.deferred.push(def, entity.id(), raw);
        }
        Some(entity)
    }

    /// Stream every `*.txt` record in the type's directory, loading each and
    /// handing it to the registration callback. Identifier collisions from
    /// the callback are logged and skipped; unreadable records are logged
    /// and skipped; directory-level IO failures abort this type's load.
    /// Returns the number of entities registered.
    pub async fn load_all<T, F, E>(&mut self, mut register: F) -> Result<usize, StorageError>
    where
        T: Indexed<R>,
        F: FnMut(T) -> Result<(), E>,
        E: Display,
    {
        let dir = self.config.directory_for::<T>()?;
        let mut entries = fs::read_dir(&dir).await?;
        let mut registered = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("txt") {
                continue;
            }
            match self.load::<T>(&path).await {
                Some(entity) => match register(entity) {
                    Ok(()) => registered += 1,
                    Err(e) => warn!("skipping {}: {}", path.display(), e),
                },
                None => error!("could not load {}", path.display()),
            }
        }
        Ok(registered)
    }

    /// Resolve every deferred attribute in recording order, then clear the
    /// registry. Must run once after all entity types have loaded; calling
    /// it again is a no-op.
    pub fn complete_load(&mut self, registry: &mut R) {
        if self.deferred.is_empty() {
            return;
        }
        self.deferred.drain(registry);
    }
}

/// Write `content` to `path` atomically: take an exclusive lock on the
/// destination, stage the bytes in a unique temp file in the same directory,
/// then rename it into place and fsync the directory.
fn write_file_locked(path: &Path, content: &str) -> Result<(), StorageError> {
    use std::fs::{File, OpenOptions};
    use std::io::Write;

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("record.txt");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    };
    std::fs::rename(&tmp_path, path)?;
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}
