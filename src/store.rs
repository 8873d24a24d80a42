// File-backed collection store: one pretty-printed JSON object per collection

use crate::error::{Result, StoreError};
use crate::id::{Clock, IdGenerator, IdPolicy};
use crate::jsonfile;
use crate::models::{CATEGORIES, Contact, Task};
use crate::record::Record;
use fs2::FileExt;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// In-memory form of a collection file: record id -> record
pub type Collection<T> = BTreeMap<String, T>;

/// Persistent store rooted at a data directory
///
/// Each collection lives in `{collection}.json`. Every mutation is a full
/// Load -> mutate -> Save cycle, serialized per collection by an in-process
/// mutex plus an advisory file lock so that concurrent writers (threads or
/// processes) never lose each other's changes.
pub struct Store {
    base_path: PathBuf,
    ids: IdGenerator,
    id_policy: IdPolicy,
    locks: Mutex<HashMap<&'static str, Arc<Mutex<()>>>>,
}

impl Store {
    /// Open a store at the given data directory
    ///
    /// Nothing is touched on disk. Collections that do not exist yet fail to
    /// load until [`Store::init`] seeds them.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            base_path: path.as_ref().to_path_buf(),
            ids: IdGenerator::default(),
            id_policy: IdPolicy::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ids = IdGenerator::new(clock);
        self
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", collection))
    }

    /// Create the data directory and seed any missing collection file.
    ///
    /// Existing files are left alone. Returns the paths that were created.
    pub fn init(&self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.base_path).map_err(|e| StoreError::write_failed("*", e))?;

        let seeds: [(&str, &[u8]); 3] = [
            (Contact::collection_name(), b"{}"),
            (Task::collection_name(), b"{}"),
            (CATEGORIES, b"[]"),
        ];

        let mut created = Vec::new();
        for (collection, seed) in seeds {
            let path = self.collection_path(collection);
            if jsonfile::write_if_missing(&path, collection, seed)? {
                info!(collection, file = ?path, "Seeded collection file");
                created.push(path);
            }
        }
        Ok(created)
    }

    // ========================================================================
    // Raw primitives
    // ========================================================================

    /// Load a whole collection. Takes no lock.
    pub fn load<T: Record>(&self) -> Result<Collection<T>> {
        let collection = T::collection_name();
        let records: Collection<T> = jsonfile::read_json(&self.collection_path(collection), collection)?;
        debug!(collection, count = records.len(), "Loaded collection");
        Ok(records)
    }

    /// Overwrite a whole collection. Takes no lock.
    ///
    /// Calling `load` and `save` directly from two writers is last-writer-wins
    /// at file granularity; use the CRUD methods for serialized access.
    pub fn save<T: Record>(&self, records: &Collection<T>) -> Result<()> {
        let collection = T::collection_name();
        jsonfile::write_json_atomic(&self.collection_path(collection), collection, records)?;
        debug!(collection, count = records.len(), "Saved collection");
        Ok(())
    }

    /// Read the categories document verbatim
    pub fn read_categories(&self) -> Result<Vec<u8>> {
        jsonfile::read_raw(&self.collection_path(CATEGORIES), CATEGORIES)
    }

    // ========================================================================
    // CRUD API
    // ========================================================================

    /// Return the whole collection
    pub fn list<T: Record>(&self) -> Result<Collection<T>> {
        self.load()
    }

    /// Create a record from a (partial) JSON body
    ///
    /// The id is always generated; an id in the body is ignored. Returns the
    /// new id and the full updated collection.
    pub fn create<T: Record>(&self, body: &[u8]) -> Result<(String, Collection<T>)> {
        let mut record: T = decode_new_record(body)?;

        let (id, records) = self.mutate::<T, _, _>(|records| {
            let id = self
                .ids
                .assign(T::id_prefix(), self.id_policy, |id| records.contains_key(id));
            record.set_id(id.clone());
            records.insert(id.clone(), record);
            id
        })?;

        info!(collection = T::collection_name(), id = %id, "Created record");
        Ok((id, records))
    }

    /// Replace the record whose id is in the body, inserting it if absent
    pub fn update<T: Record>(&self, body: &[u8]) -> Result<T> {
        let record: T = decode_body(body)?;
        Self::validate_id(record.id())?;

        let id = record.id().to_string();
        let (replaced, _) = self.mutate::<T, _, _>(|records| records.insert(id.clone(), record.clone()).is_some())?;

        info!(collection = T::collection_name(), id = %id, replaced, "Updated record");
        Ok(record)
    }

    /// Delete a record by id. Deleting a missing id is not an error.
    ///
    /// Returns whether a record was removed.
    pub fn delete<T: Record>(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Err(StoreError::BadRequest("Record ID cannot be empty".to_string()));
        }

        let (removed, _) = self.mutate::<T, _, _>(|records| records.remove(id).is_some())?;

        info!(collection = T::collection_name(), id, removed, "Deleted record");
        Ok(removed)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    /// Run one Load -> mutate -> Save cycle while holding the collection locks
    fn mutate<T, R, F>(&self, f: F) -> Result<(R, Collection<T>)>
    where
        T: Record,
        F: FnOnce(&mut Collection<T>) -> R,
    {
        let collection = T::collection_name();
        let mutex = self.collection_mutex(collection);
        let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);

        // Released when dropped, after the save
        let _file_lock = self.lock_file(collection)?;

        let mut records = self.load::<T>()?;
        let out = f(&mut records);
        self.save(&records)?;

        Ok((out, records))
    }

    fn collection_mutex(&self, collection: &'static str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(collection).or_default())
    }

    fn lock_file(&self, collection: &str) -> Result<File> {
        let lock_path = self.base_path.join(format!(".{}.lock", collection));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::lock(collection, e))?;

        file.lock_exclusive().map_err(|e| StoreError::lock(collection, e))?;
        Ok(file)
    }

    /// Validate record ID
    fn validate_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(StoreError::BadRequest(
                "Record ID cannot be empty or whitespace-only".to_string(),
            ));
        }

        if id.len() > 256 {
            return Err(StoreError::BadRequest(format!(
                "Record ID too long: {} chars (max 256)",
                id.len()
            )));
        }

        Ok(())
    }
}

/// Decode a request body into a record; only JSON objects are accepted
fn decode_body<T: Record>(body: &[u8]) -> Result<T> {
    let object = parse_object(body)?;
    serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| StoreError::BadRequest(e.to_string()))
}

/// Decode a create body. Any id spelling in the body is dropped before
/// decoding since the store assigns the id.
fn decode_new_record<T: Record>(body: &[u8]) -> Result<T> {
    let mut object = parse_object(body)?;
    for key in T::id_keys() {
        object.remove(*key);
    }
    serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| StoreError::BadRequest(e.to_string()))
}

fn parse_object(body: &[u8]) -> Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_slice(body).map_err(|e| StoreError::BadRequest(e.to_string()))? {
        serde_json::Value::Object(object) => Ok(object),
        _ => Err(StoreError::BadRequest("expected a JSON object".to_string())),
    }
}
