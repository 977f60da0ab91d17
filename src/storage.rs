//! File-backed object store.

use crate::models::{ClassName, Entity};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Live entities keyed by `<ClassName>.<id>`.
pub type Objects = BTreeMap<String, Entity>;

/// In-memory mapping of every live entity, flushed to a single JSON file.
///
/// The file holds one object: store key -> flat entity record (see
/// [`Entity::to_record`]).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    objects: Objects,
}

impl FileStorage {
    /// Creates an empty store bound to `path`. Nothing is read until [`reload`](Self::reload).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: Objects::new(),
        }
    }

    /// Creates a store and loads whatever `path` currently holds.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut storage = Self::new(path);
        storage.reload()?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> &Objects {
        &self.objects
    }

    /// The live mapping itself; removing from it removes the entity.
    pub fn all_mut(&mut self) -> &mut Objects {
        &mut self.objects
    }

    /// Registers an entity under its store key, replacing any previous one.
    pub fn insert(&mut self, entity: Entity) {
        self.objects.insert(entity.key(), entity);
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.objects.get_mut(key)
    }

    /// Entities whose key prefix names `class`; every entity when `class` is `None`.
    pub fn values_of(&self, class: Option<ClassName>) -> impl Iterator<Item = &Entity> {
        self.objects
            .iter()
            .filter(move |(key, _)| match class {
                Some(class) => key.split('.').next() == Some(class.as_str()),
                None => true,
            })
            .map(|(_, entity)| entity)
    }

    pub fn count(&self, class: Option<ClassName>) -> usize {
        self.values_of(class).count()
    }

    /// Writes every live entity to the backing file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("can't create directory {}", parent.display()))?;
        }

        let records: Map<String, Value> = self
            .objects
            .iter()
            .map(|(key, entity)| (key.clone(), Value::Object(entity.to_record())))
            .collect();

        let file = fs::File::create(&self.path)
            .with_context(|| format!("can't create {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &records)
            .with_context(|| format!("can't serialize objects to {}", self.path.display()))?;
        writer.flush()?;

        tracing::debug!(path = %self.path.display(), objects = records.len(), "store saved");
        Ok(())
    }

    /// Replaces the live mapping with the file's content.
    ///
    /// A missing file means an empty store. Records under a key that does not
    /// match their own class and id are skipped with a warning.
    pub fn reload(&mut self) -> Result<()> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store file, starting empty");
                self.objects.clear();
                return Ok(());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("can't open {}", self.path.display()));
            }
        };

        let records: Map<String, Value> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed store file {}", self.path.display()))?;

        let mut objects = Objects::new();
        for (key, record) in records {
            let record = match record {
                Value::Object(record) => record,
                _ => anyhow::bail!("record `{}` is not an object", key),
            };
            let entity = Entity::from_record(&record)
                .with_context(|| format!("can't load record `{}`", key))?;
            if entity.key() != key {
                tracing::warn!(%key, actual = %entity.key(), "skipping record stored under a foreign key");
                continue;
            }
            objects.insert(key, entity);
        }

        tracing::debug!(path = %self.path.display(), objects = objects.len(), "store loaded");
        self.objects = objects;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::env as stdenv;
    use std::io;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("hbnb_test_storage_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let storage = FileStorage::open(temp.join("absent.json")).unwrap();
        assert!(storage.all().is_empty());
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_save_then_reload_round_trip() {
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let path = temp.join("nested").join("file.json");

        let mut storage = FileStorage::new(&path);
        let mut user = Entity::new(ClassName::User);
        user.set_attribute("email", json!("a@b.c"));
        let place = Entity::new(ClassName::Place);
        storage.insert(user.clone());
        storage.insert(place.clone());
        storage.save().unwrap();

        let reloaded = FileStorage::open(&path).unwrap();
        let keys: Vec<&String> = reloaded.all().keys().collect();
        let expected: Vec<&String> = storage.all().keys().collect();
        assert_eq!(keys, expected);

        let back = reloaded.get(&user.key()).unwrap();
        assert_eq!(back.attribute("email"), Some(json!("a@b.c")));
        assert_eq!(back.class(), ClassName::User);
        assert_eq!(back.to_record(), user.to_record());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_all_mut_removal_is_persisted() {
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let path = temp.join("file.json");

        let mut storage = FileStorage::new(&path);
        let state = Entity::new(ClassName::State);
        let key = state.key();
        storage.insert(state);
        storage.save().unwrap();

        storage.all_mut().remove(&key);
        storage.save().unwrap();

        assert!(FileStorage::open(&path).unwrap().get(&key).is_none());
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_values_of_filters_by_key_prefix() {
        let mut storage = FileStorage::new("unused.json");
        storage.insert(Entity::new(ClassName::City));
        storage.insert(Entity::new(ClassName::City));
        storage.insert(Entity::new(ClassName::State));

        assert_eq!(storage.count(None), 3);
        assert_eq!(storage.count(Some(ClassName::City)), 2);
        assert_eq!(storage.count(Some(ClassName::Review)), 0);
        assert!(
            storage
                .values_of(Some(ClassName::State))
                .all(|e| e.class() == ClassName::State)
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let path = temp.join("file.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(FileStorage::open(&path).is_err());

        fs::write(&path, r#"{"User.1": 42}"#).unwrap();
        assert!(FileStorage::open(&path).is_err());
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_reload_skips_records_under_foreign_keys() {
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let path = temp.join("file.json");

        let user = Entity::new(ClassName::User);
        let mut records = Map::new();
        records.insert("Place.nope".to_string(), Value::Object(user.to_record()));
        records.insert(user.key(), Value::Object(user.to_record()));
        fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.count(None), 1);
        assert!(storage.get(&user.key()).is_some());
        let _ = fs::remove_dir_all(&temp);
    }
}
